// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::registry::{ToolRegistry, ToolSpec};
use crate::types::{Measurement, MeasurementFlags, OutputFormat};

/// Default per-run timeout when neither the config nor the CLI sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// base_dir = "/data/histories"
/// timeout_secs = 600
///
/// [tool.Plume_TCC]
/// command = "java -jar plume.jar -i TCC {input_path}"
/// input_folder = "text"
/// stages = [{ name = "construction", pattern = 'Construction: (\d+)ms' }]
///
/// [[group.fig8]]
/// name = "fig8a"
/// dirs = ["fig_8_9/2_200_0.5_10000_uniform_20"]
/// tools = ["Plume_TCC"]
/// record = ["time"]
/// ```
///
/// This is the raw, unvalidated shape. Use `BenchConfig::try_from` (or
/// [`crate::config::load_and_validate`]) to get the validated form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tools from `[tool.<name>]`, keyed by tool identifier.
    #[serde(default)]
    pub tool: BTreeMap<String, ToolConfig>,

    /// Experiment groups from `[[group.<name>]]`, each an ordered list of
    /// sub-experiments.
    #[serde(default)]
    pub group: BTreeMap<String, Vec<SubExperimentConfig>>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Root that relative dataset directories are resolved against.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Directory result tables are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Wall-clock budget per tool invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Header used for the auxiliary counter column.
    #[serde(default = "default_counter_column")]
    pub counter_column: String,

    /// Memory polling interval.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// How long to wait after SIGTERM before escalating, and how long to
    /// wait for output pipes to drain after the process is gone.
    #[serde(default = "default_kill_grace_secs")]
    pub kill_grace_secs: u64,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_counter_column() -> String {
    "counter".to_string()
}

fn default_sample_interval_ms() -> u64 {
    500
}

fn default_kill_grace_secs() -> u64 {
    5
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            output_dir: default_output_dir(),
            timeout_secs: default_timeout_secs(),
            counter_column: default_counter_column(),
            sample_interval_ms: default_sample_interval_ms(),
            kill_grace_secs: default_kill_grace_secs(),
        }
    }
}

/// `[tool.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// Shell command with a single `{input_path}` placeholder.
    pub command: String,

    /// Subfolder of each dataset directory holding this tool's inputs.
    pub input_folder: String,

    /// Ordered stage extraction rules.
    #[serde(default)]
    pub stages: Vec<StageRuleConfig>,

    /// Pattern for the auxiliary integer counter.
    #[serde(default)]
    pub counter: Option<String>,

    /// Glob patterns on input entry names that this tool must not run on.
    #[serde(default)]
    pub skip: Vec<String>,
}

/// One `{ name = "...", pattern = "..." }` entry of `stages`.
#[derive(Debug, Clone, Deserialize)]
pub struct StageRuleConfig {
    pub name: String,
    pub pattern: String,
}

/// One `[[group.<name>]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SubExperimentConfig {
    pub name: String,

    /// Dataset directories, relative to the base dir unless absolute.
    pub dirs: Vec<PathBuf>,

    /// Tool identifiers, in run order.
    pub tools: Vec<String>,

    #[serde(default)]
    pub record: Vec<Measurement>,

    #[serde(default)]
    pub format: OutputFormat,

    /// Overrides `[config].timeout_secs` for this sub-experiment.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Overrides `[config].base_dir` for this sub-experiment.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

/// Validated configuration.
///
/// Constructed only through `TryFrom<RawConfigFile>`, which compiles every
/// extraction rule and resolves every tool reference.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    settings: ConfigSection,
    registry: ToolRegistry,
    groups: BTreeMap<String, Vec<SubExperiment>>,
}

impl BenchConfig {
    pub(crate) fn new_unchecked(
        settings: ConfigSection,
        registry: ToolRegistry,
        groups: BTreeMap<String, Vec<SubExperiment>>,
    ) -> Self {
        Self {
            settings,
            registry,
            groups,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.settings
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn group(&self, name: &str) -> Option<&[SubExperiment]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

/// A validated sub-experiment: one output table.
#[derive(Debug, Clone)]
pub struct SubExperiment {
    pub name: String,
    pub dirs: Vec<PathBuf>,
    pub tools: Vec<Arc<ToolSpec>>,
    pub measurements: MeasurementFlags,
    pub format: OutputFormat,
    pub timeout: Option<Duration>,
    pub base_dir: Option<PathBuf>,
}

impl SubExperiment {
    /// File name of the emitted table, e.g. `fig8a_results.csv`.
    pub fn output_file_name(&self) -> String {
        format!("{}_results.{}", self.name, self.format.extension())
    }
}
