// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `benchgrid`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "benchgrid",
    version,
    about = "Run a grid of external verification tools over datasets and tabulate time, memory and stage metrics.",
    long_about = None
)]
pub struct CliArgs {
    /// Experiment group to run (a `[[group.<name>]]` key in the config).
    #[arg(value_name = "GROUP")]
    pub group: String,

    /// Per-run timeout in seconds, overriding the config file.
    ///
    /// If omitted, the sub-experiment's `timeout_secs`, then
    /// `[config].timeout_secs` (default 600) is used.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Path to the grid file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Directory to write result tables into, overriding `[config].output_dir`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BENCHGRID_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the resolved plan without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_is_required_and_timeout_optional() {
        let args = CliArgs::try_parse_from(["benchgrid", "fig8"]).unwrap();
        assert_eq!(args.group, "fig8");
        assert_eq!(args.timeout, None);
        assert_eq!(args.config, default_config_path());
        assert_eq!(args.config, PathBuf::from("Benchgrid.toml"));

        assert!(CliArgs::try_parse_from(["benchgrid"]).is_err());
    }

    #[test]
    fn timeout_flag_overrides() {
        let args = CliArgs::try_parse_from(["benchgrid", "fig9", "--timeout", "30"]).unwrap();
        assert_eq!(args.timeout, Some(30));
        assert!(CliArgs::try_parse_from(["benchgrid", "fig9", "--timeout", "0"]).is_err());
    }
}
