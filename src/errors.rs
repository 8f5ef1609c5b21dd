// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchgridError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unknown experiment group '{name}' (known groups: {})", known.join(", "))]
    UnknownGroup { name: String, known: Vec<String> },

    #[error("Invalid pattern '{pattern}' for tool '{tool}': {source}")]
    InvalidPattern {
        tool: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to launch '{command}': {source}")]
    LaunchFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BenchgridError>;
