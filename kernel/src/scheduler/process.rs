/*
 * Process Abstraction
 *
 * A Process is one slot of the fixed-size process table. The slot is the
 * unit of existence: it is reserved (Embryo), made runnable, cycles between
 * Runnable/Running/Sleeping under dispatcher and sleep/wakeup control,
 * terminates into a Zombie and is finally reclaimed (Unused) by its parent.
 *
 * All state writes go through `Process::transition`, which refuses any edge
 * outside the lifecycle below. A refused edge means the table is corrupted
 * and the kernel panics.
 *
 *   Unused -> Embryo -> Runnable <-> Running -> Zombie -> Unused
 *               |          ^           |
 *               v          |           v
 *             Unused       +------ Sleeping
 *
 * Scheduling attributes for all three policies live side by side on the
 * record; the inactive policies' fields are simply left alone.
 */

use core::fmt;

use heapless::String;

use super::io_wait::Channel;
use super::types::Priority;
use crate::config::PROC_NAME_LEN;

/// Unique identifier for a process
///
/// Pids are handed out monotonically starting at 1. `ProcessId::NONE` marks
/// a free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub usize);

impl ProcessId {
    /// Pid of a free slot
    pub const NONE: ProcessId = ProcessId(0);

    /// Create a new ProcessId
    pub fn new(id: usize) -> Self {
        ProcessId(id)
    }

    /// Get the raw ID value
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process({})", self.0)
    }
}

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Unused,
    Embryo,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

impl ProcessState {
    /// Whether `self -> next` is an edge of the process lifecycle
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Unused, Embryo)
                | (Embryo, Runnable)
                | (Embryo, Unused)
                | (Runnable, Running)
                | (Running, Runnable)
                | (Running, Sleeping)
                | (Running, Zombie)
                | (Sleeping, Runnable)
                | (Zombie, Unused)
        )
    }

    /// Short fixed-width label for process listings
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Unused => "unused",
            ProcessState::Embryo => "embryo",
            ProcessState::Sleeping => "sleep ",
            ProcessState::Runnable => "runble",
            ProcessState::Running => "run   ",
            ProcessState::Zombie => "zombie",
        }
    }
}

/// Per-process scheduling attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedAttrs {
    /// Priority policy: lower is more urgent
    pub static_priority: Priority,

    /// Priority policy: rounds spent Runnable without being chosen
    pub wait_time: u32,

    /// MLFQ: current level, 0 is the most urgent
    pub queue_level: usize,

    /// MLFQ: ticks left at the current level
    pub time_slice_remaining: u32,

    /// MLFQ: ticks consumed while under MLFQ accounting
    pub total_runtime: u64,

    // Reporting only.
    pub created_at_tick: u64,
    pub cpu_ticks_consumed: u64,
}

impl SchedAttrs {
    /// Fresh attributes for a newly reserved slot
    pub fn new(priority: Priority, level0_slice: u32, now: u64) -> Self {
        Self {
            static_priority: priority,
            wait_time: 0,
            queue_level: 0,
            time_slice_remaining: level0_slice,
            total_runtime: 0,
            created_at_tick: now,
            cpu_ticks_consumed: 0,
        }
    }

    const fn cleared() -> Self {
        Self {
            static_priority: Priority::DEFAULT,
            wait_time: 0,
            queue_level: 0,
            time_slice_remaining: 0,
            total_runtime: 0,
            created_at_tick: 0,
            cpu_ticks_consumed: 0,
        }
    }
}

/// One process-table slot
pub struct Process {
    /// Unique process identifier, `ProcessId::NONE` when the slot is free
    pub pid: ProcessId,

    /// Parent process (None for the root process)
    pub parent: Option<ProcessId>,

    /// Human-readable process name (for debugging)
    pub name: String<PROC_NAME_LEN>,

    /// Termination requested; observed by the process at its next checkpoint
    pub killed: bool,

    /// Scheduling attributes for every policy
    pub sched: SchedAttrs,

    state: ProcessState,
    channel: Option<Channel>,
}

impl Process {
    /// An empty slot
    pub const fn unused() -> Self {
        Process {
            pid: ProcessId::NONE,
            parent: None,
            name: String::new(),
            killed: false,
            sched: SchedAttrs::cleared(),
            state: ProcessState::Unused,
            channel: None,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Channel the process sleeps on; Some exactly when Sleeping
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn is_unused(&self) -> bool {
        self.state == ProcessState::Unused
    }

    pub fn is_runnable(&self) -> bool {
        self.state == ProcessState::Runnable
    }

    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Zombie
    }

    /// Move to `next`, panicking on an edge outside the lifecycle
    ///
    /// Leaving Sleeping always clears the channel. Sleeping itself is only
    /// entered through `sleep_on` so that the channel is never missing.
    pub(crate) fn transition(&mut self, next: ProcessState) {
        if !self.state.can_transition_to(next) || next == ProcessState::Sleeping {
            panic!(
                "illegal process transition {:?} -> {:?} for pid {}",
                self.state, next, self.pid.0
            );
        }
        self.state = next;
        self.channel = None;
    }

    /// Running -> Sleeping on `channel`
    pub(crate) fn sleep_on(&mut self, channel: Channel) {
        if !self.state.can_transition_to(ProcessState::Sleeping) {
            panic!(
                "illegal process transition {:?} -> Sleeping for pid {}",
                self.state, self.pid.0
            );
        }
        self.state = ProcessState::Sleeping;
        self.channel = Some(channel);
    }

    /// Reserve a free slot for `pid`
    pub(crate) fn reserve(
        &mut self,
        pid: ProcessId,
        name: &str,
        parent: Option<ProcessId>,
        sched: SchedAttrs,
    ) {
        self.transition(ProcessState::Embryo);
        self.pid = pid;
        self.parent = parent;
        self.name = truncated_name(name);
        self.killed = false;
        self.sched = sched;
    }

    /// Return the slot to Unused and wipe it (Embryo rollback or reaping)
    pub(crate) fn release(&mut self) {
        self.transition(ProcessState::Unused);
        self.pid = ProcessId::NONE;
        self.parent = None;
        self.name.clear();
        self.killed = false;
        self.sched = SchedAttrs::cleared();
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name.as_str())
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("channel", &self.channel)
            .field("killed", &self.killed)
            .finish()
    }
}

/// Copy as much of `name` as fits, stopping on a char boundary
fn truncated_name(name: &str) -> String<PROC_NAME_LEN> {
    let mut out = String::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProcessState::*;

    const ALL: [ProcessState; 6] = [Unused, Embryo, Sleeping, Runnable, Running, Zombie];

    #[test]
    fn lifecycle_edges_are_exactly_the_documented_ones() {
        let edges = [
            (Unused, Embryo),
            (Embryo, Runnable),
            (Embryo, Unused),
            (Runnable, Running),
            (Running, Runnable),
            (Running, Sleeping),
            (Running, Zombie),
            (Sleeping, Runnable),
            (Zombie, Unused),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    edges.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    #[should_panic(expected = "illegal process transition")]
    fn running_twice_is_fatal() {
        let mut p = Process::unused();
        p.reserve(ProcessId(1), "p", None, SchedAttrs::new(Priority::DEFAULT, 5, 0));
        p.transition(Runnable);
        p.transition(Running);
        p.transition(Running);
    }

    #[test]
    #[should_panic(expected = "illegal process transition")]
    fn zombie_cannot_become_runnable() {
        let mut p = Process::unused();
        p.reserve(ProcessId(1), "p", None, SchedAttrs::new(Priority::DEFAULT, 5, 0));
        p.transition(Runnable);
        p.transition(Running);
        p.transition(Zombie);
        p.transition(Runnable);
    }

    #[test]
    fn channel_is_set_only_while_sleeping() {
        let mut p = Process::unused();
        p.reserve(ProcessId(3), "sleeper", None, SchedAttrs::new(Priority::DEFAULT, 5, 0));
        p.transition(Runnable);
        p.transition(Running);
        p.sleep_on(Channel::Lock(7));
        assert_eq!(p.state(), Sleeping);
        assert_eq!(p.channel(), Some(Channel::Lock(7)));

        p.transition(Runnable);
        assert_eq!(p.channel(), None);
    }

    #[test]
    fn long_names_are_truncated() {
        let mut p = Process::unused();
        p.reserve(
            ProcessId(1),
            "a-very-long-process-name",
            None,
            SchedAttrs::new(Priority::DEFAULT, 5, 0),
        );
        assert_eq!(p.name.as_str(), "a-very-long-proc");

        p.release();
        assert!(p.is_unused());
        assert!(p.name.is_empty());
        assert_eq!(p.pid, ProcessId::NONE);
    }
}
