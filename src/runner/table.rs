// src/runner/table.rs

//! Row-oriented result table and its CSV rendering.

use std::collections::BTreeSet;

use crate::types::MeasurementFlags;

use super::record::RunResult;

pub const TOOL_COLUMN: &str = "tool";
pub const INPUT_COLUMN: &str = "input_path";
pub const MEMORY_COLUMN: &str = "max_memory_usage_mb";
pub const ELAPSED_COLUMN: &str = "elapsed_time_s";

/// One sub-experiment's results, flattened to text cells.
///
/// The header is `tool, input_path`, then whichever of memory / elapsed time
/// were requested, then the union of stage names any run reported (sorted),
/// then the counter column if requested. Missing values are empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Tool,
    Input,
    Memory,
    Elapsed,
    Stage(String),
    Counter,
}

impl ResultTable {
    pub fn from_results(
        results: &[RunResult],
        flags: MeasurementFlags,
        counter_column: &str,
    ) -> Self {
        let mut columns = vec![Column::Tool, Column::Input];
        if flags.peak_memory {
            columns.push(Column::Memory);
        }
        if flags.elapsed_time {
            columns.push(Column::Elapsed);
        }
        if flags.stages {
            let stage_names: BTreeSet<&str> = results
                .iter()
                .flat_map(|r| r.stages.keys().map(String::as_str))
                .collect();
            columns.extend(stage_names.into_iter().map(|s| Column::Stage(s.to_string())));
        }
        if flags.counter {
            columns.push(Column::Counter);
        }

        let header = columns
            .iter()
            .map(|c| match c {
                Column::Tool => TOOL_COLUMN.to_string(),
                Column::Input => INPUT_COLUMN.to_string(),
                Column::Memory => MEMORY_COLUMN.to_string(),
                Column::Elapsed => ELAPSED_COLUMN.to_string(),
                Column::Stage(name) => name.clone(),
                Column::Counter => counter_column.to_string(),
            })
            .collect();

        let rows = results
            .iter()
            .map(|r| columns.iter().map(|c| cell(r, c)).collect())
            .collect();

        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell of `row` under column `name`, if the column exists.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.header.iter().position(|h| h == name)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_record(&mut out, &self.header);
        for row in &self.rows {
            push_record(&mut out, row);
        }
        out
    }
}

fn cell(result: &RunResult, column: &Column) -> String {
    match column {
        Column::Tool => result.tool.clone(),
        Column::Input => result.input_path.display().to_string(),
        Column::Memory => fmt_opt(result.peak_memory_mb()),
        Column::Elapsed => fmt_opt(result.elapsed_secs),
        Column::Stage(name) => fmt_opt(result.stages.get(name)),
        Column::Counter => fmt_opt(result.counter),
    }
}

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn push_record(out: &mut String, fields: &[String]) {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
