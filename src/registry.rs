// src/registry.rs

//! Tool registry: what to run, where its inputs live, and how to read its
//! output.
//!
//! Every `ToolSpec` is built once at startup from a `[tool.<name>]` section
//! and is immutable afterwards. Patterns are compiled here so a bad regex
//! is a configuration error rather than a silent miss at run time.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::config::model::ToolConfig;
use crate::errors::{BenchgridError, Result};

/// Placeholder substituted with the absolute input path.
pub const INPUT_PLACEHOLDER: &str = "{input_path}";

/// A named duration-bearing stage and the pattern that captures it in
/// milliseconds.
#[derive(Debug, Clone)]
pub struct StageRule {
    pub name: String,
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct ToolSpec {
    id: String,
    command_template: String,
    input_folder: String,
    stages: Vec<StageRule>,
    counter: Option<Regex>,
    skip: Option<GlobSet>,
    skip_patterns: Vec<String>,
}

impl ToolSpec {
    /// Build and validate a tool from its config section.
    ///
    /// `reserved` lists column names a stage may not shadow.
    pub fn from_config(id: &str, cfg: &ToolConfig, reserved: &[&str]) -> Result<Self> {
        validate_template(id, &cfg.command)?;
        validate_input_folder(id, &cfg.input_folder)?;

        let mut seen = HashSet::new();
        let mut stages = Vec::with_capacity(cfg.stages.len());
        for rule in &cfg.stages {
            if rule.name.trim().is_empty() {
                return Err(BenchgridError::ConfigError(format!(
                    "tool '{id}' has a stage with an empty name"
                )));
            }
            if reserved.contains(&rule.name.as_str()) {
                return Err(BenchgridError::ConfigError(format!(
                    "tool '{id}' stage '{}' collides with a fixed column name",
                    rule.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(BenchgridError::ConfigError(format!(
                    "tool '{id}' declares stage '{}' more than once",
                    rule.name
                )));
            }
            stages.push(StageRule {
                name: rule.name.clone(),
                pattern: compile_capture(id, &rule.pattern)?,
            });
        }

        let counter = cfg
            .counter
            .as_deref()
            .map(|p| compile_capture(id, p))
            .transpose()?;

        let skip = build_skip_set(id, &cfg.skip)?;

        Ok(Self {
            id: id.to_string(),
            command_template: cfg.command.clone(),
            input_folder: cfg.input_folder.clone(),
            stages,
            counter,
            skip,
            skip_patterns: cfg.skip.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    pub fn input_folder(&self) -> &str {
        &self.input_folder
    }

    pub fn stages(&self) -> &[StageRule] {
        &self.stages
    }

    pub fn counter(&self) -> Option<&Regex> {
        self.counter.as_ref()
    }

    pub fn skip_patterns(&self) -> &[String] {
        &self.skip_patterns
    }

    /// Substitute the input path into the command template.
    ///
    /// The path is inserted verbatim, without shell quoting.
    pub fn render_command(&self, input_path: &Path) -> String {
        self.command_template
            .replace(INPUT_PLACEHOLDER, &input_path.display().to_string())
    }

    /// Whether an input entry (by file name) is excluded for this tool.
    pub fn skips(&self, entry_name: &str) -> bool {
        self.skip
            .as_ref()
            .is_some_and(|set| set.is_match(entry_name))
    }
}

fn validate_template(id: &str, template: &str) -> Result<()> {
    let count = template.matches(INPUT_PLACEHOLDER).count();
    if count != 1 {
        return Err(BenchgridError::ConfigError(format!(
            "tool '{id}' command must contain exactly one {INPUT_PLACEHOLDER} (found {count})"
        )));
    }
    Ok(())
}

fn validate_input_folder(id: &str, folder: &str) -> Result<()> {
    let mut components = Path::new(folder).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(BenchgridError::ConfigError(format!(
            "tool '{id}' input_folder must be a single directory name (got {folder:?})"
        ))),
    }
}

fn compile_capture(id: &str, pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern).map_err(|source| BenchgridError::InvalidPattern {
        tool: id.to_string(),
        pattern: pattern.to_string(),
        source,
    })?;
    // captures_len counts the implicit whole-match group.
    if re.captures_len() < 2 {
        return Err(BenchgridError::ConfigError(format!(
            "tool '{id}' pattern {pattern:?} has no capture group"
        )));
    }
    Ok(re)
}

fn build_skip_set(id: &str, patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        let glob = Glob::new(p).map_err(|e| {
            BenchgridError::ConfigError(format!("tool '{id}' has invalid skip glob {p:?}: {e}"))
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| {
        BenchgridError::ConfigError(format!("tool '{id}' skip globs failed to build: {e}"))
    })?;
    Ok(Some(set))
}

/// All known tools, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolSpec>>,
}

impl ToolRegistry {
    pub fn from_configs(
        configs: &BTreeMap<String, ToolConfig>,
        reserved: &[&str],
    ) -> Result<Self> {
        let mut tools = BTreeMap::new();
        for (id, cfg) in configs {
            let spec = ToolSpec::from_config(id, cfg, reserved)?;
            tools.insert(id.clone(), Arc::new(spec));
        }
        Ok(Self { tools })
    }

    pub fn get(&self, id: &str) -> Option<Arc<ToolSpec>> {
        self.tools.get(id).cloned()
    }
}
