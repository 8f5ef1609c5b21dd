// src/exec/process_tree.rs

//! Process-tree discovery and signalling.
//!
//! Tools often spawn helpers of their own (a JVM forking native workers, a
//! Python driver launching a solver), so both memory accounting and
//! termination operate on the whole tree rooted at the supervised process.
//!
//! Every function here works on a single process-table snapshot. Processes
//! that exit between the snapshot and the read/signal are simply skipped.

use std::collections::{HashMap, HashSet, VecDeque};

use sysinfo::{Pid, ProcessStatus, System};
use tracing::{debug, trace};

/// Signal sent to every member of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSignal {
    /// Polite request to exit (SIGTERM).
    Terminate,
    /// Forced kill (SIGKILL).
    Kill,
}

/// Fresh process table.
pub fn snapshot() -> System {
    let mut system = System::new();
    system.refresh_processes();
    system
}

/// All live descendants of `root` in breadth-first order.
///
/// Thread entries (which sysinfo lists alongside processes on Linux) are
/// excluded so that shared memory is not counted once per thread.
pub fn descendants(system: &System, root: Pid) -> Vec<Pid> {
    let threads: HashSet<Pid> = system
        .processes()
        .iter()
        .filter_map(|(pid, process)| process.tasks().map(|tasks| (pid, tasks)))
        .flat_map(|(pid, tasks)| tasks.iter().copied().filter(move |t| t != pid))
        .collect();

    let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
    for (pid, process) in system.processes() {
        if threads.contains(pid) {
            continue;
        }
        if let Some(parent) = process.parent() {
            children.entry(parent).or_default().push(*pid);
        }
    }

    let mut found = Vec::new();
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let Some(kids) = children.get(&current) else {
            continue;
        };
        for kid in kids {
            if seen.insert(*kid) {
                found.push(*kid);
                queue.push_back(*kid);
            }
        }
    }
    found
}

/// Whether `pid` is present and not a zombie.
pub fn is_alive(system: &System, pid: Pid) -> bool {
    system
        .process(pid)
        .is_some_and(|p| p.status() != ProcessStatus::Zombie)
}

/// Resident bytes of `root` plus all its live descendants.
///
/// `None` once the root is gone or has exited (zombie).
pub fn tree_memory(system: &System, root: Pid) -> Option<u64> {
    if !is_alive(system, root) {
        return None;
    }
    let own = system.process(root).map(|p| p.memory())?;
    let children: u64 = descendants(system, root)
        .into_iter()
        .filter_map(|pid| system.process(pid))
        .map(|p| p.memory())
        .sum();
    Some(own + children)
}

/// Resident bytes of a single process, reading only its own table entry.
///
/// Cheap enough to call right after spawning, before the process has had
/// time to exit.
pub fn process_memory(pid: Pid) -> Option<u64> {
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return None;
    }
    if !is_alive(&system, pid) {
        return None;
    }
    system.process(pid).map(|p| p.memory())
}

/// Members of the tree rooted at `root`, deepest descendants first and the
/// root itself last.
pub fn kill_order(system: &System, root: Pid) -> Vec<Pid> {
    let mut order = descendants(system, root);
    order.reverse();
    order.push(root);
    order
}

/// Send `signal` to each pid in order. Returns how many were delivered.
pub fn signal_all(pids: &[Pid], signal: TreeSignal) -> usize {
    pids.iter()
        .filter(|pid| send_signal(**pid, signal))
        .count()
}

/// Send `signal` to every pid from `pids` that is still alive.
pub fn signal_survivors(pids: &[Pid], signal: TreeSignal) -> usize {
    let system = snapshot();
    let survivors: Vec<Pid> = pids
        .iter()
        .copied()
        .filter(|pid| is_alive(&system, *pid))
        .collect();
    if !survivors.is_empty() {
        debug!(count = survivors.len(), ?signal, "signalling surviving tree members");
    }
    signal_all(&survivors, signal)
}

#[cfg(unix)]
fn send_signal(pid: Pid, signal: TreeSignal) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid as NixPid;

    let sig = match signal {
        TreeSignal::Terminate => Signal::SIGTERM,
        TreeSignal::Kill => Signal::SIGKILL,
    };
    match kill(NixPid::from_raw(pid.as_u32() as i32), sig) {
        Ok(()) => true,
        Err(Errno::ESRCH) => {
            trace!(pid = pid.as_u32(), "process already gone");
            false
        }
        Err(e) => {
            debug!(pid = pid.as_u32(), error = %e, "failed to signal process");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_signal(pid: Pid, signal: TreeSignal) -> bool {
    let system = snapshot();
    let Some(process) = system.process(pid) else {
        trace!(pid = pid.as_u32(), "process already gone");
        return false;
    };
    match signal {
        TreeSignal::Terminate => process
            .kill_with(sysinfo::Signal::Term)
            .unwrap_or_else(|| process.kill()),
        TreeSignal::Kill => process.kill(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive_and_has_memory() {
        let system = snapshot();
        let me = Pid::from_u32(std::process::id());
        assert!(is_alive(&system, me));
        assert!(tree_memory(&system, me).is_some_and(|bytes| bytes > 0));
    }

    #[test]
    fn kill_order_ends_with_root() {
        let system = snapshot();
        let me = Pid::from_u32(std::process::id());
        let order = kill_order(&system, me);
        assert_eq!(order.last(), Some(&me));
    }

    #[test]
    fn unknown_root_has_no_memory() {
        let system = snapshot();
        // Pids are bounded well below this on every supported platform.
        assert_eq!(tree_memory(&system, Pid::from_u32(u32::MAX - 1)), None);
    }

    #[test]
    fn single_process_memory_reads_own_entry() {
        let me = Pid::from_u32(std::process::id());
        assert!(process_memory(me).is_some_and(|bytes| bytes > 0));
        assert_eq!(process_memory(Pid::from_u32(u32::MAX - 1)), None);
    }
}
