// src/types.rs

use std::fmt;

use serde::Deserialize;

/// One kind of measurement a sub-experiment can ask for.
///
/// Maps to the `record = [...]` list of a `[[group.<name>]]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    /// Wall-clock elapsed time of the whole invocation.
    Time,
    /// Peak resident memory of the process tree.
    Memory,
    /// Tool-reported stage durations.
    Stages,
    /// Tool-reported auxiliary integer counter.
    Counter,
}

/// Flags describing which measurements a run should collect.
///
/// Fields that are not requested are always `None` / empty in the
/// resulting `RunResult`, never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasurementFlags {
    pub elapsed_time: bool,
    pub peak_memory: bool,
    pub stages: bool,
    pub counter: bool,
}

impl MeasurementFlags {
    pub fn from_measurements(list: &[Measurement]) -> Self {
        let mut flags = Self::default();
        for m in list {
            match m {
                Measurement::Time => flags.elapsed_time = true,
                Measurement::Memory => flags.peak_memory = true,
                Measurement::Stages => flags.stages = true,
                Measurement::Counter => flags.counter = true,
            }
        }
        flags
    }

    /// Every measurement enabled.
    pub fn all() -> Self {
        Self {
            elapsed_time: true,
            peak_memory: true,
            stages: true,
            counter: true,
        }
    }
}

impl fmt::Display for MeasurementFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.elapsed_time {
            names.push("time");
        }
        if self.peak_memory {
            names.push("memory");
        }
        if self.stages {
            names.push("stages");
        }
        if self.counter {
            names.push("counter");
        }
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// How a sub-experiment's results are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One row per run with the requested measurement columns.
    Csv,
    /// One record per run with the raw combined tool output.
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Csv
    }
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_measurement_list() {
        let flags = MeasurementFlags::from_measurements(&[Measurement::Memory, Measurement::Counter]);
        assert!(!flags.elapsed_time);
        assert!(flags.peak_memory);
        assert!(!flags.stages);
        assert!(flags.counter);
        assert_eq!(flags.to_string(), "memory,counter");
    }
}
