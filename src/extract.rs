// src/extract.rs

//! Metric extraction from unstructured tool output.
//!
//! Tools report their internal stage timings as free text; each tool's
//! `ToolSpec` carries the rules that find them. A rule that does not match
//! simply leaves its stage out of the result. Nothing here can fail.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use crate::registry::ToolSpec;

/// Stage name -> duration in seconds.
pub type StageDurations = BTreeMap<String, f64>;

/// Everything extracted from one run's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetrics {
    pub stages: StageDurations,
    pub counter: Option<u64>,
}

/// Join stdout and stderr the way every extraction rule expects to see them.
pub fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push('\n');
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}

/// Apply all of a tool's rules to its combined output.
pub fn extract(tool: &ToolSpec, output: &str) -> ExtractedMetrics {
    ExtractedMetrics {
        stages: extract_stages(tool, output),
        counter: extract_counter(tool, output),
    }
}

/// First match of every stage rule, converted from milliseconds to seconds.
pub fn extract_stages(tool: &ToolSpec, output: &str) -> StageDurations {
    let mut stages = StageDurations::new();
    for rule in tool.stages() {
        match first_capture(&rule.pattern, output).map(str::parse::<f64>) {
            Some(Ok(millis)) => {
                stages.insert(rule.name.clone(), millis / 1000.0);
            }
            Some(Err(e)) => {
                debug!(
                    tool = %tool.id(),
                    stage = %rule.name,
                    error = %e,
                    "stage capture is not a number; treating as absent"
                );
            }
            None => {}
        }
    }
    stages
}

/// First match of the tool's counter rule, if it has one.
pub fn extract_counter(tool: &ToolSpec, output: &str) -> Option<u64> {
    let pattern = tool.counter()?;
    match first_capture(pattern, output)?.parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            debug!(tool = %tool.id(), error = %e, "counter capture is not an integer; treating as absent");
            None
        }
    }
}

fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}
