// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{BenchConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** compile patterns
/// or resolve tool references. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse raw TOML text.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and run startup validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Compiles every extraction pattern and skip glob.
/// - Resolves every tool a sub-experiment references.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BenchConfig> {
    let raw_config = load_from_path(&path)?;
    BenchConfig::try_from(raw_config)
}

/// Default grid file: `Benchgrid.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Benchgrid.toml")
}
