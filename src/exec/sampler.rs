// src/exec/sampler.rs

//! Peak-memory sampling for a supervised process tree.
//!
//! The sampler runs on its own blocking thread and owns its running maximum
//! exclusively. The supervisor tells it to stop through a channel once the
//! process has exited (or been killed) and then awaits the thread, whose
//! return value is the peak. Nothing else ever reads the maximum.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::process_tree;

/// Default polling interval.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Source of memory readings for one supervised process.
pub trait MemoryProbe: Send + 'static {
    /// Current resident bytes of the watched tree, or `None` once the
    /// process is no longer running.
    fn sample(&mut self) -> Option<u64>;
}

/// Probe that reads the live process table.
pub struct ProcessTreeProbe {
    system: System,
    root: Pid,
}

impl ProcessTreeProbe {
    pub fn new(root_pid: u32) -> Self {
        Self {
            system: System::new(),
            root: Pid::from_u32(root_pid),
        }
    }
}

impl MemoryProbe for ProcessTreeProbe {
    fn sample(&mut self) -> Option<u64> {
        self.system.refresh_processes();
        process_tree::tree_memory(&self.system, self.root)
    }
}

/// Handle to a running sampler thread.
pub struct MemorySampler {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<Option<u64>>,
}

impl MemorySampler {
    /// Start sampling `probe` every `interval` on a dedicated thread.
    ///
    /// `seed` is a reading taken before the thread started; it counts
    /// towards the maximum like any other sample.
    pub fn spawn<P: MemoryProbe>(mut probe: P, interval: Duration, seed: Option<u64>) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = tokio::task::spawn_blocking(move || {
            sample_until_stopped(&mut probe, interval, &stop_rx, seed)
        });
        Self { stop_tx, handle }
    }

    /// Stop sampling and return the maximum observed.
    ///
    /// Call only after the supervised process is known to be gone, so the
    /// last sample has already been taken. `None` if no sample was ever
    /// recorded.
    pub async fn finish(self) -> Option<u64> {
        // The thread may already have stopped on its own.
        let _ = self.stop_tx.send(());
        match self.handle.await {
            Ok(peak) => peak,
            Err(e) => {
                warn!(error = %e, "memory sampler thread failed");
                None
            }
        }
    }
}

/// Poll `probe` until it reports the process gone or a stop arrives.
///
/// The interval wait doubles as the stop check, so a stop request ends the
/// loop without waiting out the rest of the interval.
pub fn sample_until_stopped<P: MemoryProbe + ?Sized>(
    probe: &mut P,
    interval: Duration,
    stop_rx: &mpsc::Receiver<()>,
    seed: Option<u64>,
) -> Option<u64> {
    let mut peak = seed;
    let mut samples = 0usize;

    loop {
        match probe.sample() {
            Some(bytes) => {
                samples += 1;
                peak = Some(peak.map_or(bytes, |p| p.max(bytes)));
            }
            None => break,
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(samples, peak_bytes = ?peak, "memory sampler stopped");
    peak
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    struct Scripted(std::vec::IntoIter<u64>);

    impl MemoryProbe for Scripted {
        fn sample(&mut self) -> Option<u64> {
            self.0.next()
        }
    }

    #[test]
    fn keeps_the_maximum_not_the_last_reading() {
        let (_tx, rx) = mpsc::channel();
        let mut probe = Scripted(vec![10 * MB, 50 * MB, 5 * MB, 30 * MB].into_iter());
        let peak = sample_until_stopped(&mut probe, Duration::from_millis(1), &rx, None);
        assert_eq!(peak, Some(50 * MB));
    }

    #[test]
    fn vanished_process_before_first_sample_yields_none() {
        let (_tx, rx) = mpsc::channel();
        let mut probe = Scripted(Vec::new().into_iter());
        assert_eq!(sample_until_stopped(&mut probe, Duration::from_millis(1), &rx, None), None);
    }

    #[test]
    fn seed_survives_a_process_that_is_already_gone() {
        let (_tx, rx) = mpsc::channel();
        let mut probe = Scripted(Vec::new().into_iter());
        let peak = sample_until_stopped(&mut probe, Duration::from_millis(1), &rx, Some(3 * MB));
        assert_eq!(peak, Some(3 * MB));
    }

    #[test]
    fn later_samples_can_exceed_the_seed() {
        let (_tx, rx) = mpsc::channel();
        let mut probe = Scripted(vec![MB, 8 * MB].into_iter());
        let peak = sample_until_stopped(&mut probe, Duration::from_millis(1), &rx, Some(2 * MB));
        assert_eq!(peak, Some(8 * MB));
    }

    #[test]
    fn stop_request_ends_sampling() {
        struct Forever;
        impl MemoryProbe for Forever {
            fn sample(&mut self) -> Option<u64> {
                Some(7)
            }
        }

        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        let peak = sample_until_stopped(&mut Forever, Duration::from_secs(60), &rx, None);
        assert_eq!(peak, Some(7));
    }

    #[tokio::test]
    async fn spawned_sampler_returns_peak_after_finish() {
        let probe = Scripted(vec![3, 9, 4].into_iter());
        let sampler = MemorySampler::spawn(probe, Duration::from_millis(1), None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sampler.finish().await, Some(9));
    }
}
