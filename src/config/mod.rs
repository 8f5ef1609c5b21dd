// src/config/mod.rs

//! Configuration loading and validation for benchgrid.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a grid file from disk (`loader.rs`).
//! - Validate it at startup and resolve tool references (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    BenchConfig, ConfigSection, RawConfigFile, StageRuleConfig, SubExperiment,
    SubExperimentConfig, ToolConfig, DEFAULT_TIMEOUT_SECS,
};
