/*
 * Scheduler Type Definitions
 *
 * This module defines the small Copy-able types shared by the process table,
 * the dispatcher and the policies, plus the bounded records handed out to
 * reporting collaborators (ps/top style listings, CPU statistics).
 */

use core::fmt;

use heapless::String;

use super::process::{ProcessId, ProcessState};
use crate::config::PROC_NAME_LEN;

/// CPU identifier
///
/// Indexes the per-CPU dispatcher records. CpuId(0) is the bootstrap CPU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CpuId(pub u32);

impl CpuId {
    /// Bootstrap processor (CPU 0)
    pub const BSP: CpuId = CpuId(0);

    /// Get the CPU ID as a usize for indexing
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Static process priority
///
/// Lower values are more urgent. The priority policy picks the numerically
/// smallest value and ages starving processes towards `HIGHEST`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u32);

impl Priority {
    /// Most urgent priority; aging never goes below this
    pub const HIGHEST: Priority = Priority(0);

    /// Priority of a freshly allocated process
    pub const DEFAULT: Priority = Priority(60);

    /// Least urgent priority accepted from callers
    pub const LOWEST: Priority = Priority(100);

    /// Whether callers may set this value
    pub fn is_valid(self) -> bool {
        self <= Self::LOWEST
    }

    /// One step more urgent, floored at `HIGHEST`
    pub fn promoted(self) -> Priority {
        Priority(self.0.saturating_sub(1))
    }
}

/// Dispatch policy selector
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolicyId {
    RoundRobin = 0,
    Priority = 1,
    Mlfq = 2,
}

impl PolicyId {
    pub const ALL: [PolicyId; 3] = [PolicyId::RoundRobin, PolicyId::Priority, PolicyId::Mlfq];

    /// Decode a raw policy number as passed across the syscall boundary
    pub fn from_raw(raw: u32) -> Option<PolicyId> {
        match raw {
            0 => Some(PolicyId::RoundRobin),
            1 => Some(PolicyId::Priority),
            2 => Some(PolicyId::Mlfq),
            _ => None,
        }
    }

    /// Lossy decode: unknown numbers fall back to round-robin
    pub fn from_raw_or_default(raw: u32) -> PolicyId {
        Self::from_raw(raw).unwrap_or(PolicyId::RoundRobin)
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PolicyId::RoundRobin => "Round-Robin",
            PolicyId::Priority => "Priority",
            PolicyId::Mlfq => "MLFQ",
        }
    }
}

/// A reserved table slot together with the pid it was reserved for
///
/// The pid makes stale handles detectable once the slot is recycled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub slot: usize,
    pub pid: ProcessId,
}

/// Per-process record exported to reporting tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcInfo {
    pub pid: ProcessId,
    pub ppid: Option<ProcessId>,
    pub state: ProcessState,
    pub name: String<PROC_NAME_LEN>,
    pub priority: Priority,
    pub mlfq_level: usize,
    pub created_tick: u64,
    pub cpu_ticks: u64,
}

/// One procdump line: `pid state name`
impl fmt::Display for ProcInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.pid.0, self.state.as_str(), self.name)
    }
}

/// Dispatcher counters summed over all CPUs
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Scheduling rounds started
    pub total_rounds: u64,

    /// Rounds that found nothing runnable
    pub idle_rounds: u64,

    /// Processes handed the CPU
    pub context_switches: u64,
}

/// Coarse system summary
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SysInfo {
    /// Non-Unused table slots
    pub nproc: usize,
    pub ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_policy_ids_round_trip_and_fall_back() {
        for policy in PolicyId::ALL {
            assert_eq!(PolicyId::from_raw(policy.as_raw()), Some(policy));
        }
        assert_eq!(PolicyId::from_raw(3), None);
        assert_eq!(PolicyId::from_raw_or_default(42), PolicyId::RoundRobin);
    }

    #[test]
    fn procdump_line_shows_pid_state_and_name() {
        let mut name = String::new();
        name.push_str("sh").unwrap();
        let info = ProcInfo {
            pid: ProcessId(7),
            ppid: None,
            state: ProcessState::Sleeping,
            name,
            priority: Priority::DEFAULT,
            mlfq_level: 1,
            created_tick: 0,
            cpu_ticks: 3,
        };
        assert_eq!(format!("{}", info), "7 sleep  sh");
    }

    #[test]
    fn priority_promotion_floors_at_highest() {
        assert_eq!(Priority(5).promoted(), Priority(4));
        assert_eq!(Priority::HIGHEST.promoted(), Priority::HIGHEST);
        assert!(Priority::LOWEST.is_valid());
        assert!(!Priority(101).is_valid());
    }
}
