use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use benchgrid::errors::{BenchgridError, Result};
use benchgrid::exec::{Supervised, Termination, ToolExecutor};
use benchgrid::runner::RunRequest;

/// What the fake should pretend a tool did.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Exited normally with this output and these measurements.
    Completed {
        stdout: String,
        stderr: String,
        elapsed: Duration,
        peak_memory: u64,
    },
    /// Ran into the timeout after printing `stdout`.
    TimedOut { stdout: String },
    /// Could not be launched.
    LaunchFailed,
}

impl FakeOutcome {
    pub fn completed(stdout: &str) -> Self {
        FakeOutcome::Completed {
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed: Duration::from_millis(1500),
            peak_memory: 64 * 1024 * 1024,
        }
    }
}

/// A fake executor that:
/// - records every request it was given (tool id, input path)
/// - answers with the scripted outcome for the request's tool, or a plain
///   successful run with empty output if nothing was scripted.
///
/// Like the real supervisor, it only reports memory when the request asked
/// for it.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    outcomes: HashMap<String, FakeOutcome>,
    executed: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcome(mut self, tool: &str, outcome: FakeOutcome) -> Self {
        self.outcomes.insert(tool.to_string(), outcome);
        self
    }

    /// Shared log of `(tool, input_path)` pairs in execution order.
    pub fn executed(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.executed)
    }
}

impl ToolExecutor for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Supervised>> + Send + 'a>> {
        let outcome = self
            .outcomes
            .get(request.tool_id())
            .cloned()
            .unwrap_or_else(|| FakeOutcome::completed(""));
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push((
                    request.tool_id().to_string(),
                    request.input_path.display().to_string(),
                ));
            }

            let measure_memory = request.measurements.peak_memory;
            match outcome {
                FakeOutcome::Completed {
                    stdout,
                    stderr,
                    elapsed,
                    peak_memory,
                } => Ok(Supervised {
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                    elapsed: Some(elapsed),
                    peak_memory: measure_memory.then_some(peak_memory),
                    termination: Termination::Exited(Some(0)),
                    output_complete: true,
                }),
                FakeOutcome::TimedOut { stdout } => Ok(Supervised {
                    stdout: stdout.into_bytes(),
                    stderr: Vec::new(),
                    elapsed: None,
                    peak_memory: measure_memory.then_some(1024),
                    termination: Termination::TimedOut,
                    output_complete: true,
                }),
                FakeOutcome::LaunchFailed => Err(BenchgridError::LaunchFailure {
                    command: request.command.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such tool"),
                }),
            }
        })
    }
}
