// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runner talks to a `ToolExecutor` instead of spawning processes
//! directly. Production uses [`ProcessExecutor`], which supervises a real
//! child process; tests swap in a scripted executor that never touches the
//! OS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::Result;
use crate::runner::RunRequest;

use super::sampler::DEFAULT_SAMPLE_INTERVAL;
use super::supervisor::{supervise, Supervised, SupervisorOptions};

/// Trait abstracting how a single run request is executed.
pub trait ToolExecutor: Send {
    /// Execute one request.
    ///
    /// `Err` means the run produced nothing usable (e.g. the command could
    /// not be launched); a timeout is still `Ok`.
    fn execute<'a>(
        &'a mut self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Supervised>> + Send + 'a>>;
}

/// Executor that runs each request as a supervised shell command.
#[derive(Debug, Clone, Copy)]
pub struct ProcessExecutor {
    kill_grace: Duration,
    sample_interval: Duration,
}

impl ProcessExecutor {
    pub fn new(kill_grace: Duration, sample_interval: Duration) -> Self {
        Self {
            kill_grace,
            sample_interval,
        }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), DEFAULT_SAMPLE_INTERVAL)
    }
}

impl ToolExecutor for ProcessExecutor {
    fn execute<'a>(
        &'a mut self,
        request: &'a RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Supervised>> + Send + 'a>> {
        let options = SupervisorOptions {
            timeout: request.timeout,
            kill_grace: self.kill_grace,
            sample_interval: self.sample_interval,
            measure_memory: request.measurements.peak_memory,
        };

        Box::pin(async move { supervise(&request.command, &options).await })
    }
}
