// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::config::model::{BenchConfig, RawConfigFile, SubExperiment, SubExperimentConfig};
use crate::errors::{BenchgridError, Result};
use crate::registry::ToolRegistry;
use crate::runner::table::{ELAPSED_COLUMN, INPUT_COLUMN, MEMORY_COLUMN, TOOL_COLUMN};
use crate::types::MeasurementFlags;

impl TryFrom<RawConfigFile> for BenchConfig {
    type Error = crate::errors::BenchgridError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;

        let reserved = [
            TOOL_COLUMN,
            INPUT_COLUMN,
            MEMORY_COLUMN,
            ELAPSED_COLUMN,
            raw.config.counter_column.as_str(),
        ];
        let registry = ToolRegistry::from_configs(&raw.tool, &reserved)?;

        let mut groups = BTreeMap::new();
        for (group_name, subs) in raw.group.iter() {
            groups.insert(group_name.clone(), resolve_group(group_name, subs, &registry)?);
        }

        Ok(BenchConfig::new_unchecked(raw.config, registry, groups))
    }
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tool.is_empty() {
        return Err(BenchgridError::ConfigError(
            "config must contain at least one [tool.<name>] section".to_string(),
        ));
    }
    if cfg.group.is_empty() {
        return Err(BenchgridError::ConfigError(
            "config must contain at least one [[group.<name>]] entry".to_string(),
        ));
    }
    if cfg.config.timeout_secs == 0 {
        return Err(BenchgridError::ConfigError(
            "[config].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.sample_interval_ms == 0 {
        return Err(BenchgridError::ConfigError(
            "[config].sample_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.counter_column.trim().is_empty() {
        return Err(BenchgridError::ConfigError(
            "[config].counter_column must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn resolve_group(
    group: &str,
    subs: &[SubExperimentConfig],
    registry: &ToolRegistry,
) -> Result<Vec<SubExperiment>> {
    if subs.is_empty() {
        return Err(BenchgridError::ConfigError(format!(
            "group '{group}' has no sub-experiments"
        )));
    }

    let mut names = HashSet::new();
    let mut resolved = Vec::with_capacity(subs.len());

    for sub in subs {
        if !names.insert(sub.name.as_str()) {
            return Err(BenchgridError::ConfigError(format!(
                "group '{group}' declares sub-experiment '{}' more than once",
                sub.name
            )));
        }

        let mut tools = Vec::with_capacity(sub.tools.len());
        for id in sub.tools.iter() {
            let spec = registry.get(id).ok_or_else(|| {
                BenchgridError::ConfigError(format!(
                    "sub-experiment '{}' in group '{group}' references unknown tool '{id}'",
                    sub.name
                ))
            })?;
            tools.push(spec);
        }

        if sub.timeout_secs == Some(0) {
            return Err(BenchgridError::ConfigError(format!(
                "sub-experiment '{}' timeout_secs must be >= 1 (got 0)",
                sub.name
            )));
        }

        resolved.push(SubExperiment {
            name: sub.name.clone(),
            dirs: sub.dirs.clone(),
            tools,
            measurements: MeasurementFlags::from_measurements(&sub.record),
            format: sub.format,
            timeout: sub.timeout_secs.map(Duration::from_secs),
            base_dir: sub.base_dir.clone(),
        });
    }

    Ok(resolved)
}
