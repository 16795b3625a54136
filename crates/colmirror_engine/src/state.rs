//! Single-flight state and sync statistics.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Whether a manager currently runs a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No sync in flight.
    Idle,
    /// A sync is in flight; further calls are skipped.
    Running,
}

impl SyncState {
    /// Returns true while a sync is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, SyncState::Running)
    }
}

/// Non-blocking, non-queueing mutual exclusion for one manager.
#[derive(Debug)]
pub struct SyncFlag {
    state: Mutex<SyncState>,
}

impl SyncFlag {
    /// Creates an idle flag.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SyncState::Idle),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Moves from `Idle` to `Running`.
    ///
    /// Returns `None` without waiting if a sync is already running. The flag
    /// returns to `Idle` when the guard is dropped, whichever way the holder
    /// exits.
    pub fn try_acquire(&self) -> Option<SyncGuard<'_>> {
        let mut state = self.state.lock();
        match *state {
            SyncState::Running => None,
            SyncState::Idle => {
                *state = SyncState::Running;
                Some(SyncGuard { flag: self })
            }
        }
    }
}

impl Default for SyncFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds a [`SyncFlag`] in the `Running` state.
#[derive(Debug)]
#[must_use = "the flag returns to idle as soon as the guard is dropped"]
pub struct SyncGuard<'a> {
    flag: &'a SyncFlag,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        *self.flag.state.lock() = SyncState::Idle;
    }
}

/// Statistics about the runs of one manager.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that completed.
    pub runs_completed: u64,
    /// Calls rejected because a run was in flight.
    pub runs_skipped: u64,
    /// Runs that ended with a swallowed error.
    pub runs_suppressed: u64,
    /// Runs that returned an error to the caller.
    pub runs_failed: u64,
    /// Collections mirrored over all completed runs.
    pub collections_synced: u64,
    /// Items applied over all completed runs.
    pub items_applied: u64,
    /// Collections evicted over all completed runs.
    pub collections_evicted: u64,
    /// End of the last completed run.
    pub last_sync_time: Option<Instant>,
    /// Duration of the last completed run.
    pub last_duration: Option<Duration>,
    /// Last error message, cleared by a completed run.
    pub last_error: Option<String>,
}
