//! Registry of running child process ids.
//!
//! Every run registers its child's pid right after launch and removes it
//! when the child's exit or error is observed, or when the run is dropped
//! before either happens. A tracker can be shared by cloning; all clones see
//! the same registry.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, warn};

use super::signal;

/// Shared set of pids for children that are still running.
#[derive(Debug, Clone, Default)]
pub struct ProcessTracker {
    pids: Arc<Mutex<Vec<u32>>>,
}

impl ProcessTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u32>> {
        // A panic elsewhere cannot leave a Vec<u32> half-updated.
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a newly launched pid.
    pub fn register(&self, pid: u32) {
        let mut pids = self.lock();
        if !pids.contains(&pid) {
            pids.push(pid);
        }
    }

    /// Forget a pid.
    pub fn remove(&self, pid: u32) {
        self.lock().retain(|p| *p != pid);
    }

    /// Whether `pid` is currently tracked.
    pub fn contains(&self, pid: u32) -> bool {
        self.lock().contains(&pid)
    }

    /// Snapshot of tracked pids, in launch order.
    pub fn pids(&self) -> Vec<u32> {
        self.lock().clone()
    }

    /// Number of tracked pids.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Send `SIGTERM` to every tracked pid.
    ///
    /// Does not wait for the processes to exit and does not touch the
    /// registry; each run removes its own pid once the exit is observed.
    pub fn kill_all(&self) {
        for pid in self.pids() {
            debug!(pid, "Killing tracked process");
            if let Err(e) = signal::terminate(pid) {
                warn!(pid, error = %e, "Failed to signal tracked process");
            }
        }
    }
}

/// Keeps one pid registered until released or dropped.
#[derive(Debug)]
pub(crate) struct Registration {
    tracker: ProcessTracker,
    pid: Option<u32>,
}

impl Registration {
    /// Register `pid` (if known) in `tracker`.
    pub(crate) fn new(tracker: ProcessTracker, pid: Option<u32>) -> Self {
        if let Some(pid) = pid {
            tracker.register(pid);
        }
        Self { tracker, pid }
    }

    /// The registered pid, until released.
    pub(crate) const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Remove the pid now. Later calls and the eventual drop do nothing,
    /// so a reused pid registered by another run is left alone.
    pub(crate) fn release(&mut self) {
        if let Some(pid) = self.pid.take() {
            self.tracker.remove(pid);
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(pid) = self.pid {
            debug!(pid, "Run dropped before its process was reaped");
        }
        self.release();
    }
}

/// The process-wide tracker shared by [`crate::run`] and friends.
pub fn global_tracker() -> &'static ProcessTracker {
    static GLOBAL: OnceLock<ProcessTracker> = OnceLock::new();
    GLOBAL.get_or_init(ProcessTracker::new)
}
