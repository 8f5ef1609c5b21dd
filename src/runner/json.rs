// src/runner/json.rs

//! Raw-output report: one `{tool, input_path, output}` record per run.

use serde::Serialize;

use crate::errors::Result;

use super::record::RunResult;

#[derive(Debug, Serialize)]
struct RawOutputRecord<'a> {
    tool: &'a str,
    input_path: String,
    /// `null` when the tool could not be run at all.
    output: Option<&'a str>,
}

pub fn render_json(results: &[RunResult]) -> Result<String> {
    let records: Vec<RawOutputRecord<'_>> = results
        .iter()
        .map(|r| RawOutputRecord {
            tool: &r.tool,
            input_path: r.input_path.display().to_string(),
            output: r.output.as_deref(),
        })
        .collect();
    let mut text = serde_json::to_string_pretty(&records).map_err(anyhow::Error::from)?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::StageDurations;
    use std::path::PathBuf;

    #[test]
    fn failed_runs_serialize_output_as_null() {
        let ok = RunResult {
            tool: "Cobra".to_string(),
            input_path: PathBuf::from("/h/cobra/tap-a"),
            elapsed_secs: None,
            peak_memory_bytes: None,
            stages: StageDurations::new(),
            counter: None,
            output: Some("ACCEPT\n".to_string()),
            timed_out: false,
            exit_code: Some(0),
        };
        let failed = RunResult {
            tool: "Cobra".to_string(),
            input_path: PathBuf::from("/h/cobra/tap-b"),
            output: None,
            exit_code: None,
            ..ok.clone()
        };

        let text = render_json(&[ok, failed]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["tool"], "Cobra");
        assert_eq!(value[0]["input_path"], "/h/cobra/tap-a");
        assert_eq!(value[0]["output"], "ACCEPT\n");
        assert!(value[1]["output"].is_null());
    }
}
