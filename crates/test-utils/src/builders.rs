#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use benchgrid::config::{
    BenchConfig, ConfigSection, RawConfigFile, StageRuleConfig, SubExperimentConfig, ToolConfig,
};
use benchgrid::types::{Measurement, OutputFormat};

/// Builder for `BenchConfig` to simplify test setup.
pub struct BenchConfigBuilder {
    config: RawConfigFile,
}

impl BenchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                tool: BTreeMap::new(),
                group: BTreeMap::new(),
            },
        }
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.base_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.config.output_dir = dir.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.config.timeout_secs = secs;
        self
    }

    pub fn counter_column(mut self, name: &str) -> Self {
        self.config.config.counter_column = name.to_string();
        self
    }

    pub fn with_tool(mut self, id: &str, tool: ToolConfig) -> Self {
        self.config.tool.insert(id.to_string(), tool);
        self
    }

    pub fn with_sub_experiment(mut self, group: &str, sub: SubExperimentConfig) -> Self {
        self.config.group.entry(group.to_string()).or_default().push(sub);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> BenchConfig {
        BenchConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for BenchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ToolConfig`.
pub struct ToolConfigBuilder {
    tool: ToolConfig,
}

impl ToolConfigBuilder {
    pub fn new(command: &str, input_folder: &str) -> Self {
        Self {
            tool: ToolConfig {
                command: command.to_string(),
                input_folder: input_folder.to_string(),
                stages: vec![],
                counter: None,
                skip: vec![],
            },
        }
    }

    pub fn stage(mut self, name: &str, pattern: &str) -> Self {
        self.tool.stages.push(StageRuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn counter(mut self, pattern: &str) -> Self {
        self.tool.counter = Some(pattern.to_string());
        self
    }

    pub fn skip(mut self, glob: &str) -> Self {
        self.tool.skip.push(glob.to_string());
        self
    }

    pub fn build(self) -> ToolConfig {
        self.tool
    }
}

/// Builder for one `[[group.<name>]]` entry.
pub struct SubExperimentBuilder {
    sub: SubExperimentConfig,
}

impl SubExperimentBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            sub: SubExperimentConfig {
                name: name.to_string(),
                dirs: vec![],
                tools: vec![],
                record: vec![],
                format: OutputFormat::Csv,
                timeout_secs: None,
                base_dir: None,
            },
        }
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sub.dirs.push(dir.into());
        self
    }

    pub fn tool(mut self, id: &str) -> Self {
        self.sub.tools.push(id.to_string());
        self
    }

    pub fn record(mut self, m: Measurement) -> Self {
        self.sub.record.push(m);
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.sub.format = format;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.sub.timeout_secs = Some(secs);
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sub.base_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> SubExperimentConfig {
        self.sub
    }
}
