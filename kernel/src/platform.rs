/*
 * Platform Collaborators
 *
 * The scheduling core does not own execution contexts, memory, files or
 * locks. Everything it needs from the rest of the kernel comes through the
 * narrow traits below, bundled into a Platform at boot:
 *
 * - ContextSwitch: run a process until it gives the CPU back
 * - KernelStacks: per-slot execution stacks
 * - ResourceCleanup: release files/cwd of a terminating process
 * - LockOwnership: who holds the resource behind a channel (deadlock detector)
 * - TickSource: the time base for boosts and snapshots
 */

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::ProcError;
use crate::scheduler::io_wait::Channel;
use crate::scheduler::process::ProcessId;
use crate::scheduler::running::RunningProcess;
use crate::scheduler::types::CpuId;

/// Opaque suspend-and-resume of a process
///
/// `switch_to` runs `process` on `cpu` and returns once the process has given
/// the CPU back through one of the burst-ending operations on
/// `RunningProcess` (yield, block, sleep, exit or a blocking reap). The table
/// lock is not held while it runs.
pub trait ContextSwitch: Send + Sync {
    fn switch_to(&self, cpu: CpuId, process: &mut RunningProcess<'_>);
}

/// Kernel execution stacks, one per table slot
pub trait KernelStacks: Send + Sync {
    /// Provide a stack for `slot`; called without the table lock held
    fn alloc_stack(&self, slot: usize) -> Result<(), ProcError>;

    /// Return the stack of a reaped slot
    fn free_stack(&self, slot: usize);
}

/// Per-process resources owned outside the scheduler
pub trait ResourceCleanup: Send + Sync {
    /// Close files and drop the working directory of `pid`
    ///
    /// Called once per terminating process, without the table lock held.
    /// Failures are the collaborator's business.
    fn release(&self, pid: ProcessId);
}

/// Lock-ownership lookup for the deadlock detector
///
/// May answer from unsynchronized state; a stale answer only degrades the
/// detector's precision.
pub trait LockOwnership: Send + Sync {
    fn holder_of(&self, channel: Channel) -> Option<ProcessId>;
}

/// Monotonic tick counter
pub trait TickSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Collaborators the kernel is built with
#[derive(Clone)]
pub struct Platform {
    pub switch: Arc<dyn ContextSwitch>,
    pub stacks: Arc<dyn KernelStacks>,
    pub cleanup: Arc<dyn ResourceCleanup>,
    pub locks: Arc<dyn LockOwnership>,
    pub ticks: Arc<dyn TickSource>,
}

impl Platform {
    /// Platform with the given context switch and default collaborators
    ///
    /// Stacks are preallocated, cleanup does nothing, no lock has a known
    /// owner and time only moves when the returned ticks are advanced.
    pub fn new(switch: Arc<dyn ContextSwitch>) -> Self {
        Self {
            switch,
            stacks: Arc::new(PreallocatedStacks),
            cleanup: Arc::new(NoCleanup),
            locks: Arc::new(NoLockOwners),
            ticks: Arc::new(AtomicTicks::new()),
        }
    }

    pub fn with_stacks(mut self, stacks: Arc<dyn KernelStacks>) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_cleanup(mut self, cleanup: Arc<dyn ResourceCleanup>) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn with_locks(mut self, locks: Arc<dyn LockOwnership>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_ticks(mut self, ticks: Arc<dyn TickSource>) -> Self {
        self.ticks = ticks;
        self
    }
}

/// Every slot has a stack reserved at build time
#[derive(Debug, Default)]
pub struct PreallocatedStacks;

impl KernelStacks for PreallocatedStacks {
    fn alloc_stack(&self, _slot: usize) -> Result<(), ProcError> {
        Ok(())
    }

    fn free_stack(&self, _slot: usize) {}
}

#[derive(Debug, Default)]
pub struct NoCleanup;

impl ResourceCleanup for NoCleanup {
    fn release(&self, _pid: ProcessId) {}
}

#[derive(Debug, Default)]
pub struct NoLockOwners;

impl LockOwnership for NoLockOwners {
    fn holder_of(&self, _channel: Channel) -> Option<ProcessId> {
        None
    }
}

/// Tick counter driven by the timer interrupt
///
/// The interrupt handler calls `tick()`; everything else reads.
#[derive(Debug, Default)]
pub struct AtomicTicks {
    ticks: AtomicU64,
}

impl AtomicTicks {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    /// Advance by one tick
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn advance(&self, delta: u64) {
        self.ticks.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn set(&self, value: u64) {
        self.ticks.store(value, Ordering::Relaxed);
    }
}

impl TickSource for AtomicTicks {
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}
