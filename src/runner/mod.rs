// src/runner/mod.rs

//! Experiment runner.
//!
//! Walks one experiment group: for every sub-experiment it resolves the
//! dataset directories, enumerates each tool's inputs, runs every
//! (tool, input) pair strictly one after another, and writes one table once
//! all pairs are done. A missing directory or a failed run never stops the
//! grid; it is logged and the walk continues.

pub mod json;
pub mod record;
pub mod table;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{BenchConfig, SubExperiment};
use crate::errors::Result;
use crate::exec::ToolExecutor;
use crate::fs::FileSystem;
use crate::types::OutputFormat;

pub use record::{RunRequest, RunResult};
pub use table::ResultTable;

/// Run-wide settings threaded through the runner.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Timeout used when a sub-experiment does not set its own.
    pub default_timeout: Duration,
    /// Timeout forced from the command line; beats everything else.
    pub timeout_override: Option<Duration>,
    pub counter_column: String,
}

impl RunSettings {
    pub fn from_config(
        cfg: &BenchConfig,
        timeout_override: Option<Duration>,
        output_dir: Option<PathBuf>,
    ) -> Self {
        let s = cfg.settings();
        Self {
            base_dir: s.base_dir.clone(),
            output_dir: output_dir.unwrap_or_else(|| s.output_dir.clone()),
            default_timeout: Duration::from_secs(s.timeout_secs),
            timeout_override,
            counter_column: s.counter_column.clone(),
        }
    }

    /// CLI override, then the sub-experiment's own timeout, then the
    /// config-wide default.
    pub fn timeout_for(&self, sub: &SubExperiment) -> Duration {
        self.timeout_override
            .or(sub.timeout)
            .unwrap_or(self.default_timeout)
    }
}

/// Results and output location of one finished sub-experiment.
#[derive(Debug, Clone)]
pub struct SubExperimentReport {
    pub name: String,
    pub output_path: PathBuf,
    pub results: Vec<RunResult>,
}

pub struct ExperimentRunner<E: ToolExecutor, F: FileSystem> {
    executor: E,
    fs: F,
    settings: RunSettings,
}

impl<E: ToolExecutor, F: FileSystem> ExperimentRunner<E, F> {
    pub fn new(executor: E, fs: F, settings: RunSettings) -> Self {
        Self {
            executor,
            fs,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run every sub-experiment of a group in order.
    pub async fn run_group(&mut self, subs: &[SubExperiment]) -> Result<Vec<SubExperimentReport>> {
        let mut reports = Vec::with_capacity(subs.len());
        for sub in subs {
            reports.push(self.run_sub_experiment(sub).await?);
        }
        Ok(reports)
    }

    /// Run all pairs of one sub-experiment, then write its table.
    pub async fn run_sub_experiment(&mut self, sub: &SubExperiment) -> Result<SubExperimentReport> {
        info!(
            sub_experiment = %sub.name,
            measurements = %sub.measurements,
            timeout_s = self.settings.timeout_for(sub).as_secs(),
            "starting sub-experiment"
        );

        let results = self.collect(sub).await;
        let output_path = self.emit(sub, &results)?;

        info!(
            sub_experiment = %sub.name,
            runs = results.len(),
            path = %output_path.display(),
            "results written"
        );

        Ok(SubExperimentReport {
            name: sub.name.clone(),
            output_path,
            results,
        })
    }

    /// Run every request of the sub-experiment and gather one result each.
    pub async fn collect(&mut self, sub: &SubExperiment) -> Vec<RunResult> {
        let requests = self.plan(sub);
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.run_one(&request).await);
        }
        results
    }

    /// Resolve dataset directories and tool inputs into run requests.
    ///
    /// Missing directories and odd entries are logged and skipped here.
    pub fn plan(&self, sub: &SubExperiment) -> Vec<RunRequest> {
        let base_dir = sub.base_dir.as_deref().unwrap_or(&self.settings.base_dir);
        let timeout = self.settings.timeout_for(sub);
        let capture_output = sub.format == OutputFormat::Json;

        let mut requests = Vec::new();
        for dir in &sub.dirs {
            let dataset_dir = base_dir.join(dir);
            if !self.fs.is_dir(&dataset_dir) {
                warn!(
                    sub_experiment = %sub.name,
                    dir = %dataset_dir.display(),
                    "dataset directory does not exist; skipping"
                );
                continue;
            }

            for tool in &sub.tools {
                let tool_dir = dataset_dir.join(tool.input_folder());
                for input in self.list_inputs(tool.id(), &tool_dir) {
                    let name = input
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    if tool.skips(&name) {
                        info!(tool = %tool.id(), input = %name, "input excluded by skip rule");
                        continue;
                    }
                    requests.push(RunRequest::new(
                        tool.clone(),
                        input,
                        sub.measurements,
                        timeout,
                        capture_output,
                    ));
                }
            }
        }
        requests
    }

    /// Immediate files and subdirectories of a tool's input folder, sorted.
    fn list_inputs(&self, tool: &str, tool_dir: &Path) -> Vec<PathBuf> {
        if !self.fs.is_dir(tool_dir) {
            warn!(tool = %tool, dir = %tool_dir.display(), "tool input directory does not exist; skipping");
            return Vec::new();
        }

        let mut entries = match self.fs.read_dir(tool_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(tool = %tool, dir = %tool_dir.display(), error = %e, "cannot list tool input directory; skipping");
                return Vec::new();
            }
        };
        entries.sort();

        entries
            .into_iter()
            .filter(|entry| {
                let usable = self.fs.is_dir(entry) || self.fs.is_file(entry);
                if !usable {
                    warn!(tool = %tool, input = %entry.display(), "input is neither a directory nor a file; skipping");
                }
                usable
            })
            .collect()
    }

    /// Execute one request. Always yields exactly one result.
    pub async fn run_one(&mut self, request: &RunRequest) -> RunResult {
        info!(
            tool = %request.tool_id(),
            input = %request.input_path.display(),
            cmd = %request.command,
            "running tool"
        );

        match self.executor.execute(request).await {
            Ok(run) => {
                if run.timed_out() {
                    warn!(
                        tool = %request.tool_id(),
                        input = %request.input_path.display(),
                        "run timed out; timing recorded as missing"
                    );
                } else if let Some(code) = run.exit_code().filter(|c| *c != 0) {
                    warn!(
                        tool = %request.tool_id(),
                        input = %request.input_path.display(),
                        exit_code = code,
                        "tool exited with non-zero status"
                    );
                }
                RunResult::from_supervised(request, &run)
            }
            Err(e) => {
                error!(
                    tool = %request.tool_id(),
                    input = %request.input_path.display(),
                    error = %e,
                    "run failed; recording empty result"
                );
                RunResult::failed(request)
            }
        }
    }

    /// Write the sub-experiment's table in its configured format.
    pub fn emit(&self, sub: &SubExperiment, results: &[RunResult]) -> Result<PathBuf> {
        let path = self.settings.output_dir.join(sub.output_file_name());
        let contents = match sub.format {
            OutputFormat::Csv => {
                ResultTable::from_results(results, sub.measurements, &self.settings.counter_column)
                    .to_csv()
            }
            OutputFormat::Json => json::render_json(results)?,
        };
        self.fs.write(&path, contents.as_bytes())?;
        Ok(path)
    }
}
