/*
 * Scheduler Configuration
 *
 * Compile-time capacities size the fixed tables (process slots, CPUs, MLFQ
 * levels). Everything that only tunes behaviour lives in SchedConfig so a
 * kernel image (or a test) can pick its own time slices and intervals.
 */

use crate::error::ProcError;
use crate::scheduler::types::{PolicyId, Priority};

/// Maximum number of processes
pub const NPROC: usize = 64;

/// Maximum number of CPUs running a dispatcher
pub const NCPU: usize = 8;

/// Number of MLFQ levels (0 = most urgent)
pub const NQUEUE: usize = 3;

/// Process name length, including room for truncation
pub const PROC_NAME_LEN: usize = 16;

/// `wait_time` saturates here instead of wrapping
pub const WAIT_TIME_CAP: u32 = 10_000;

/// Runtime scheduler tunables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedConfig {
    /// Tick budget of each MLFQ level
    pub time_slices: [u32; NQUEUE],

    /// A global boost fires once `now > last_boost + boost_interval`
    pub boost_interval: u64,

    /// Periodic recorder snapshot spacing in ticks
    pub snapshot_interval: u64,

    /// Recorder capacity; snapshots past this are dropped
    pub max_snapshots: usize,

    /// Priority policy promotes a process once `wait_time` exceeds this
    pub aging_threshold: u32,

    /// Static priority given to freshly allocated processes
    pub default_priority: Priority,

    /// Policy the dispatcher starts with
    pub initial_policy: PolicyId,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self {
            time_slices: [5, 10, 20],
            boost_interval: 1000,
            snapshot_interval: 100,
            max_snapshots: 1000,
            aging_threshold: 50,
            default_priority: Priority::DEFAULT,
            initial_policy: PolicyId::Mlfq,
        }
    }

    /// Budget of an MLFQ level; levels past the last one use the last budget
    pub fn time_slice(&self, level: usize) -> u32 {
        self.time_slices[level.min(NQUEUE - 1)]
    }

    /// Reject configurations the dispatcher cannot run with
    pub fn validate(&self) -> Result<(), ProcError> {
        if self.time_slices.iter().any(|&slice| slice == 0) {
            return Err(ProcError::InvalidArgument);
        }
        if self.max_snapshots == 0 || self.snapshot_interval == 0 {
            return Err(ProcError::InvalidArgument);
        }
        if !self.default_priority.is_valid() {
            return Err(ProcError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}
