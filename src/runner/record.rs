// src/runner/record.rs

//! Per-run request and result records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::exec::Supervised;
use crate::extract::{self, ExtractedMetrics, StageDurations};
use crate::registry::ToolSpec;
use crate::types::MeasurementFlags;

/// One (tool, input) pair to run. Consumed by exactly one execution.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tool: Arc<ToolSpec>,
    pub input_path: PathBuf,
    /// Command with the input path already substituted.
    pub command: String,
    pub measurements: MeasurementFlags,
    pub timeout: Duration,
    /// Keep the combined output in the result (raw-output JSON mode).
    pub capture_output: bool,
}

impl RunRequest {
    pub fn new(
        tool: Arc<ToolSpec>,
        input_path: PathBuf,
        measurements: MeasurementFlags,
        timeout: Duration,
        capture_output: bool,
    ) -> Self {
        let command = tool.render_command(&input_path);
        Self {
            tool,
            input_path,
            command,
            measurements,
            timeout,
            capture_output,
        }
    }

    pub fn tool_id(&self) -> &str {
        self.tool.id()
    }
}

/// Outcome of one `RunRequest`.
///
/// Optional fields are `None` when the measurement was not requested or
/// could not be recovered; they are never defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub tool: String,
    pub input_path: PathBuf,
    pub elapsed_secs: Option<f64>,
    pub peak_memory_bytes: Option<u64>,
    pub stages: StageDurations,
    pub counter: Option<u64>,
    /// Combined stdout/stderr, kept only when the request asked for it.
    pub output: Option<String>,
    pub timed_out: bool,
    pub exit_code: Option<i32>,
}

impl RunResult {
    /// All-empty result for a run that produced nothing usable.
    pub fn failed(request: &RunRequest) -> Self {
        Self {
            tool: request.tool_id().to_string(),
            input_path: request.input_path.clone(),
            elapsed_secs: None,
            peak_memory_bytes: None,
            stages: StageDurations::new(),
            counter: None,
            output: None,
            timed_out: false,
            exit_code: None,
        }
    }

    /// Build the result from a supervised run, keeping only what the
    /// request asked for.
    pub fn from_supervised(request: &RunRequest, run: &Supervised) -> Self {
        let flags = request.measurements;
        let text = run.combined_output();

        let metrics = if flags.stages || flags.counter {
            extract::extract(&request.tool, &text)
        } else {
            ExtractedMetrics::default()
        };
        let stages = if flags.stages {
            metrics.stages
        } else {
            StageDurations::new()
        };
        let counter = metrics.counter.filter(|_| flags.counter);

        Self {
            tool: request.tool_id().to_string(),
            input_path: request.input_path.clone(),
            elapsed_secs: run
                .elapsed
                .filter(|_| flags.elapsed_time)
                .map(|d| d.as_secs_f64()),
            peak_memory_bytes: run.peak_memory.filter(|_| flags.peak_memory),
            stages,
            counter,
            output: request.capture_output.then_some(text),
            timed_out: run.timed_out(),
            exit_code: run.exit_code(),
        }
    }

    /// Peak memory in mebibytes, as emitted in tables.
    pub fn peak_memory_mb(&self) -> Option<f64> {
        self.peak_memory_bytes
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
    }
}
