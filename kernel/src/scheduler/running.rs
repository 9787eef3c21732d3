/*
 * Process-Context Operations
 *
 * A RunningProcess is what a process holds while it owns a CPU. It is handed
 * to the ContextSwitch for the duration of one burst and is the only way to
 * act "as the current process": yield, block, sleep, fork, exit and reap.
 *
 * ## Giving the CPU back
 *
 * The dispatcher releases the table lock before the switch. Every operation
 * that ends the burst re-acquires it, performs its own state transition and
 * then parks the *held* guard here instead of releasing it. The dispatcher
 * picks the guard up after the switch returns and finishes its bookkeeping
 * under the same critical section, so no other CPU ever sees a process that
 * left Running but has not been accounted for.
 *
 * Ending a burst twice, or returning from the switch without ending it, is
 * a broken invariant and panics.
 */

use spin::{Mutex, MutexGuard};

use super::io_wait::{self, Channel};
use super::process::{ProcessId, ProcessState};
use super::types::CpuId;
use super::{Kernel, KernelState};
use crate::error::ProcError;

/// Result of a successful `reap`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// A zombie child was reclaimed; the burst continues
    Reaped(ProcessId),

    /// Children exist but none has exited; the process now sleeps until
    /// one does and the burst is over
    Blocked,
}

/// Token for re-acquiring a lock released by `block_on`
#[must_use = "the caller's lock must be re-acquired after waking"]
pub struct Reacquire<'a, T> {
    lock: &'a Mutex<T>,
}

impl<'a, T> Reacquire<'a, T> {
    /// Take the caller's lock again once the process runs
    pub fn relock(self) -> MutexGuard<'a, T> {
        self.lock.lock()
    }
}

/// The process currently owning a CPU
pub struct RunningProcess<'k> {
    kernel: &'k Kernel,
    pid: ProcessId,
    slot: usize,
    cpu: CpuId,
    handback: Option<MutexGuard<'k, KernelState>>,
}

impl<'k> RunningProcess<'k> {
    pub(crate) fn new(kernel: &'k Kernel, cpu: CpuId, slot: usize, pid: ProcessId) -> Self {
        Self {
            kernel,
            pid,
            slot,
            cpu,
            handback: None,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    pub fn kernel(&self) -> &'k Kernel {
        self.kernel
    }

    /// Whether the burst has already ended
    pub fn has_yielded(&self) -> bool {
        self.handback.is_some()
    }

    fn ensure_running(&self) {
        if self.handback.is_some() {
            panic!("pid {} acted after giving up the CPU", self.pid.0);
        }
    }

    fn hand_back(&mut self, guard: MutexGuard<'k, KernelState>) {
        self.handback = Some(guard);
    }

    /// Termination requested for this process
    pub fn is_killed(&self) -> bool {
        self.ensure_running();
        self.kernel.state.lock().table.slot(self.slot).killed
    }

    /// Give up the CPU for one scheduling round
    pub fn yield_now(&mut self) {
        self.ensure_running();
        let mut state = self.kernel.state.lock();
        state.table.slot_mut(self.slot).transition(ProcessState::Runnable);
        self.hand_back(state);
    }

    /// Atomically release `guard` and sleep on `channel`
    ///
    /// The table lock is taken before the caller's lock is released, so a
    /// waker that holds the caller's lock cannot slip in between. The returned
    /// token re-acquires the caller's lock once the process runs again.
    pub fn block_on<'a, T>(
        &mut self,
        channel: Channel,
        lock: &'a Mutex<T>,
        guard: MutexGuard<'a, T>,
    ) -> Reacquire<'a, T> {
        self.ensure_running();
        let mut state = self.kernel.state.lock();
        drop(guard);
        state.table.slot_mut(self.slot).sleep_on(channel);
        self.hand_back(state);
        Reacquire { lock }
    }

    /// Sleep on `channel`; the caller holds no other lock
    pub fn sleep_on(&mut self, channel: Channel) {
        self.ensure_running();
        let mut state = self.kernel.state.lock();
        state.table.slot_mut(self.slot).sleep_on(channel);
        self.hand_back(state);
    }

    /// Wake every process sleeping on `channel`
    pub fn wake_all(&self, channel: Channel) -> usize {
        self.ensure_running();
        self.kernel.wake_all(channel)
    }

    /// Create a Runnable child
    ///
    /// The child inherits this process's static priority and MLFQ level.
    pub fn fork(&self, name: &str) -> Result<ProcessId, ProcError> {
        self.ensure_running();
        let handle = self.kernel.create(name, Some(self.pid), Some(self.slot))?;
        self.kernel.make_runnable(handle)?;
        log::debug!("[proc] pid {} forked pid {}", self.pid.0, handle.pid.0);
        Ok(handle.pid)
    }

    /// Terminate this process
    ///
    /// Releases external resources, wakes the parent, hands children over to
    /// the root process and becomes a Zombie. The burst is over afterwards.
    pub fn exit(&mut self) {
        self.ensure_running();

        let root = self.kernel.state.lock().table.root();
        if root == Some(self.pid) {
            panic!("root process (pid {}) exiting", self.pid.0);
        }

        self.kernel.platform.cleanup.release(self.pid);

        let mut state = self.kernel.state.lock();
        let table = &mut state.table;

        if let Some(parent) = table.slot(self.slot).parent {
            io_wait::wakeup(table, Channel::Child(parent));
        }

        let mut orphaned_zombie = false;
        for process in table.iter_mut() {
            if !process.is_unused() && process.parent == Some(self.pid) {
                process.parent = root;
                orphaned_zombie |= process.is_zombie();
            }
        }
        if let (Some(root), true) = (root, orphaned_zombie) {
            io_wait::wakeup(table, Channel::Child(root));
        }

        table.slot_mut(self.slot).transition(ProcessState::Zombie);
        log::debug!("[proc] pid {} exited", self.pid.0);
        self.hand_back(state);
    }

    /// Reclaim one exited child
    ///
    /// Returns `Reaped` with the child's pid if a zombie child exists. With
    /// live children only, the process sleeps until one exits and `Blocked`
    /// is returned; call `reap` again in the next burst.
    pub fn reap(&mut self) -> Result<ReapOutcome, ProcError> {
        self.ensure_running();
        let mut state = self.kernel.state.lock();

        let mut has_children = false;
        let mut zombie = None;
        for (slot, process) in state.table.iter().enumerate() {
            if process.is_unused() || process.parent != Some(self.pid) {
                continue;
            }
            has_children = true;
            if process.is_zombie() {
                zombie = Some((slot, process.pid));
                break;
            }
        }

        if let Some((slot, pid)) = zombie {
            self.kernel.platform.stacks.free_stack(slot);
            state.table.slot_mut(slot).release();
            log::debug!("[proc] pid {} reaped pid {}", self.pid.0, pid.0);
            return Ok(ReapOutcome::Reaped(pid));
        }

        if !has_children {
            return Err(ProcError::NoChildren);
        }
        if state.table.slot(self.slot).killed {
            return Err(ProcError::Killed);
        }

        state.table.slot_mut(self.slot).sleep_on(Channel::Child(self.pid));
        self.hand_back(state);
        Ok(ReapOutcome::Blocked)
    }

    /// Hand the held table lock to the dispatcher
    pub(crate) fn into_handback(self) -> MutexGuard<'k, KernelState> {
        match self.handback {
            Some(guard) => guard,
            None => panic!(
                "pid {} returned to the dispatcher while still Running",
                self.pid.0
            ),
        }
    }
}
