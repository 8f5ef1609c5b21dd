// src/exec/supervisor.rs

//! Single-invocation process supervisor.
//!
//! Runs one shell command under a hard wall-clock timeout, optionally
//! sampling the peak memory of its process tree, and always hands back a
//! [`Supervised`] record unless the command could not be started at all.

use std::process::Stdio;
use std::time::{Duration, Instant};

use sysinfo::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{BenchgridError, Result};
use crate::extract::combine_output;

use super::output::{Captured, StreamCapture};
use super::process_tree::{self, TreeSignal};
use super::sampler::{MemorySampler, ProcessTreeProbe, DEFAULT_SAMPLE_INTERVAL};

/// Timing knobs for one supervised run.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Wall-clock budget measured from launch.
    pub timeout: Duration,
    /// Wait after SIGTERM before escalating to SIGKILL; also bounds how long
    /// output pipes may take to drain once the process is gone.
    pub kill_grace: Duration,
    /// Memory polling interval.
    pub sample_interval: Duration,
    /// Whether to run the memory sampler at all.
    pub measure_memory: bool,
}

impl SupervisorOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            kill_grace: Duration::from_secs(5),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            measure_memory: false,
        }
    }
}

/// How the supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exited on its own; exit code if it had one (none when killed by a
    /// signal it did not receive from us).
    Exited(Option<i32>),
    /// Exceeded the timeout and was terminated along with its descendants.
    TimedOut,
}

/// Raw outcome of one supervised command.
#[derive(Debug, Clone)]
pub struct Supervised {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Wall-clock time to natural completion; `None` after a timeout.
    pub elapsed: Option<Duration>,
    /// Peak resident bytes of the process tree; `None` only if memory was
    /// not measured. A run too short to be observed reports 0.
    pub peak_memory: Option<u64>,
    pub termination: Termination,
    /// False if either stream was cut off before EOF.
    pub output_complete: bool,
}

impl Supervised {
    /// stdout, a newline, then stderr, decoded lossily.
    pub fn combined_output(&self) -> String {
        combine_output(&self.stdout, &self.stderr)
    }

    pub fn timed_out(&self) -> bool {
        self.termination == Termination::TimedOut
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited(code) => code,
            Termination::TimedOut => None,
        }
    }
}

/// Exit codes `sh` uses when the command itself could not be started:
/// found but not executable, and not found.
const SHELL_CANNOT_EXECUTE: i32 = 126;
const SHELL_NOT_FOUND: i32 = 127;

/// Build a shell command appropriate for the platform.
fn shell_command(command: &str) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run `command` to completion or timeout.
///
/// Returns `Err(LaunchFailure)` if the process could not be started,
/// including the shell reporting the command as missing or not
/// executable, and `Err(IoError)` if waiting on it failed; a timeout is a normal
/// `Ok` result with [`Termination::TimedOut`] and no elapsed time.
pub async fn supervise(command: &str, options: &SupervisorOptions) -> Result<Supervised> {
    let start = Instant::now();
    let mut child = shell_command(command)
        .spawn()
        .map_err(|source| BenchgridError::LaunchFailure {
            command: command.to_string(),
            source,
        })?;

    let pid = child.id();
    debug!(?pid, cmd = %command, "process started");

    let stdout = StreamCapture::spawn("stdout", child.stdout.take());
    let stderr = StreamCapture::spawn("stderr", child.stderr.take());

    let sampler = match (options.measure_memory, pid) {
        (true, Some(pid)) => {
            // Read the root before it has a chance to exit; a short-lived
            // tool may be gone by the sampler thread's first poll.
            let seed = process_tree::process_memory(Pid::from_u32(pid));
            Some(MemorySampler::spawn(
                ProcessTreeProbe::new(pid),
                options.sample_interval,
                seed,
            ))
        }
        (true, None) => {
            debug!("process exited before sampling could start");
            None
        }
        (false, _) => None,
    };

    let waited = tokio::time::timeout(options.timeout, child.wait()).await;
    let outcome = match waited {
        Ok(Ok(status)) => Ok((Termination::Exited(status.code()), Some(start.elapsed()))),
        Ok(Err(e)) => {
            warn!(?pid, error = %e, "waiting on process failed; terminating its tree");
            terminate_tree(&mut child, pid, options.kill_grace).await;
            Err(BenchgridError::IoError(e))
        }
        Err(_) => {
            warn!(
                ?pid,
                timeout_s = options.timeout.as_secs_f64(),
                "process timed out; terminating its tree"
            );
            terminate_tree(&mut child, pid, options.kill_grace).await;
            Ok((Termination::TimedOut, None))
        }
    };

    // The process is gone now; only then is the sampler's maximum final.
    let peak_memory = match sampler {
        Some(sampler) => sampler.finish().await,
        None => None,
    };
    let peak_memory = if options.measure_memory {
        if peak_memory.is_none() {
            debug!(?pid, "no memory sample taken before exit; reporting 0");
        }
        Some(peak_memory.unwrap_or(0))
    } else {
        None
    };

    let Captured {
        bytes: stdout,
        complete: stdout_complete,
    } = stdout.finish(options.kill_grace).await;
    let Captured {
        bytes: stderr,
        complete: stderr_complete,
    } = stderr.finish(options.kill_grace).await;

    let (termination, elapsed) = outcome?;
    if let Termination::Exited(Some(code)) = termination {
        if let Some(source) = shell_launch_error(code, &stderr) {
            return Err(BenchgridError::LaunchFailure {
                command: command.to_string(),
                source,
            });
        }
    }
    info!(
        ?pid,
        ?termination,
        elapsed_s = elapsed.map(|d| d.as_secs_f64()),
        peak_memory_bytes = peak_memory,
        "process finished"
    );

    Ok(Supervised {
        stdout,
        stderr,
        elapsed,
        peak_memory,
        termination,
        output_complete: stdout_complete && stderr_complete,
    })
}

/// Map the shell's "could not run this" exit codes to an I/O error
/// carrying the shell's own message.
fn shell_launch_error(code: i32, stderr: &[u8]) -> Option<std::io::Error> {
    if cfg!(windows) {
        return None;
    }
    let kind = match code {
        SHELL_NOT_FOUND => std::io::ErrorKind::NotFound,
        SHELL_CANNOT_EXECUTE => std::io::ErrorKind::PermissionDenied,
        _ => return None,
    };
    let message = String::from_utf8_lossy(stderr).trim().to_string();
    Some(std::io::Error::new(kind, message))
}

/// SIGTERM every descendant then the root; escalate to SIGKILL for anything
/// still alive after `grace`.
///
/// The tree is captured before any signal is sent: once the root dies its
/// children are reparented and can no longer be found through it.
async fn terminate_tree(child: &mut Child, pid: Option<u32>, grace: Duration) {
    let Some(pid) = pid else {
        let _ = child.kill().await;
        return;
    };

    let members = process_tree::kill_order(&process_tree::snapshot(), Pid::from_u32(pid));
    let delivered = process_tree::signal_all(&members, TreeSignal::Terminate);
    debug!(pid, members = members.len(), delivered, "sent SIGTERM to process tree");

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(_) => {}
        Err(_) => {
            warn!(pid, "process ignored SIGTERM; sending SIGKILL");
            if let Err(e) = child.kill().await {
                warn!(pid, error = %e, "failed to kill root process");
            }
        }
    }

    // Descendants that outlived the root would otherwise be orphaned.
    let killed = process_tree::signal_survivors(&members, TreeSignal::Kill);
    if killed > 0 {
        warn!(pid, killed, "killed tree members that survived SIGTERM");
    }
}
