/*
 * Process Scheduler
 *
 * This module is the scheduling core of the kernel: the process table, the
 * per-CPU dispatcher with its three interchangeable policies, the
 * sleep/wakeup protocol and the hooks the deadlock detector reads from.
 *
 * LOCKING:
 * ========
 *
 * One coarse lock (`Kernel::state`) guards the process table together with
 * every scheduling global that goes with it: the per-CPU records, the policy
 * instances (MLFQ boost timestamp), the MLFQ recorder and the tunables. Every
 * state transition happens under it.
 *
 * The active policy id sits behind its own small lock so that a CPU never
 * reads a torn value; it is read once at the top of every round.
 *
 * PROCESS LIFECYCLE:
 * ==================
 *
 *   allocate -> Embryo -> make_runnable -> Runnable <-> Running -> Zombie
 *                                             ^           |          |
 *                                             |           v          v
 *                                             +------ Sleeping     reap -> Unused
 *
 * - Runnable -> Running: the dispatcher picked the process
 * - Running -> Runnable: the burst ended with a yield
 * - Running -> Sleeping: block_on/sleep_on (or reap with live children)
 * - Sleeping -> Runnable: wake_all on its channel, or signal_kill
 * - Running -> Zombie: exit
 * - Zombie -> Unused: the parent (or root, for orphans) reaped it
 *
 * ROUND:
 * ======
 *
 * 1. read the policy id, read the tick counter
 * 2. lock, let the policy do its round housekeeping (MLFQ boost, snapshots)
 * 3. pick a Runnable slot, mark it Running
 * 4. unlock, switch to it, get the lock handed back when its burst ends
 * 5. post-run accounting (MLFQ slice), repeat from 3 until the policy stops
 */

use alloc::vec::Vec;

use heapless::Vec as BoundedVec;
use spin::{Mutex, Once};

pub mod io_wait;
pub mod policies;
pub mod process;
pub mod recorder;
pub mod running;
pub mod sched_core;
pub mod table;
pub mod traits;
pub mod types;

pub use io_wait::Channel;
pub use process::{Process, ProcessId, ProcessState};
pub use recorder::{MlfqRecorder, MlfqSnapshot};
pub use running::{ReapOutcome, Reacquire, RunningProcess};
pub use sched_core::{PerCpuSchedState, SchedulerCore};
pub use table::ProcTable;
pub use traits::{SchedCtx, Scheduler};
pub use types::{CpuId, CpuStats, PolicyId, Priority, ProcInfo, ProcessHandle, SysInfo};

use crate::config::{NCPU, NPROC, SchedConfig};
use crate::deadlock::{self, DeadlockInfo, WaitForGraph};
use crate::error::ProcError;
use crate::platform::Platform;

/// Everything guarded by the table lock
pub(crate) struct KernelState {
    pub(crate) table: ProcTable,
    pub(crate) core: SchedulerCore,
    pub(crate) recorder: MlfqRecorder,
    pub(crate) config: SchedConfig,
}

/// The scheduling core
pub struct Kernel {
    pub(crate) state: Mutex<KernelState>,
    policy: Mutex<PolicyId>,
    pub(crate) platform: Platform,
    cpu_count: usize,
}

/// Global kernel instance
static KERNEL: Once<Kernel> = Once::new();

/// Initialize the global kernel
///
/// Later calls return the instance built by the first successful one.
pub fn init(
    config: SchedConfig,
    platform: Platform,
    cpu_count: usize,
) -> Result<&'static Kernel, ProcError> {
    KERNEL.try_call_once(|| Kernel::new(config, platform, cpu_count))
}

/// The global kernel, once `init` has run
pub fn kernel() -> Option<&'static Kernel> {
    KERNEL.get()
}

impl Kernel {
    /// Build a kernel for `cpu_count` CPUs
    pub fn new(
        config: SchedConfig,
        platform: Platform,
        cpu_count: usize,
    ) -> Result<Self, ProcError> {
        config.validate()?;
        if cpu_count == 0 || cpu_count > NCPU {
            return Err(ProcError::InvalidArgument);
        }

        let policy = config.initial_policy;
        log::info!("Scheduler initialized: {} policy, {} process slots", policy.name(), NPROC);

        Ok(Self {
            state: Mutex::new(KernelState {
                table: ProcTable::new(),
                core: SchedulerCore::new(cpu_count),
                recorder: MlfqRecorder::new(config.max_snapshots),
                config,
            }),
            policy: Mutex::new(policy),
            platform,
            cpu_count,
        })
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn config(&self) -> SchedConfig {
        self.state.lock().config.clone()
    }

    // ========================================================================
    // PROCESS LIFECYCLE
    // ========================================================================

    /// Reserve a slot and its kernel stack
    ///
    /// With `inherit_from`, the new process copies that slot's static
    /// priority and MLFQ level. On stack failure the slot is rolled back.
    pub(crate) fn create(
        &self,
        name: &str,
        parent: Option<ProcessId>,
        inherit_from: Option<usize>,
    ) -> Result<ProcessHandle, ProcError> {
        let now = self.platform.ticks.now();

        let handle = {
            let mut state = self.state.lock();
            let KernelState { table, config, .. } = &mut *state;

            let (priority, level) = match inherit_from {
                Some(slot) => {
                    let sched = &table.slot(slot).sched;
                    (sched.static_priority, sched.queue_level)
                }
                None => (config.default_priority, 0),
            };

            let handle = table
                .reserve(name, parent, priority, config.time_slice(0), now)
                .inspect_err(|_| {
                    log::warn!("[proc] process table full, cannot create '{}'", name)
                })?;

            let sched = &mut table.slot_mut(handle.slot).sched;
            sched.queue_level = level;
            sched.time_slice_remaining = config.time_slice(level);
            handle
        };

        if let Err(err) = self.platform.stacks.alloc_stack(handle.slot) {
            log::warn!("[proc] no kernel stack for pid {}: {}", handle.pid.0, err);
            self.state.lock().table.slot_mut(handle.slot).release();
            return Err(ProcError::OutOfMemory);
        }

        Ok(handle)
    }

    /// Create the root process that adopts orphans
    ///
    /// The root is Runnable on return and may never exit.
    pub fn spawn_root(&self, name: &str) -> Result<ProcessId, ProcError> {
        if self.state.lock().table.root().is_some() {
            return Err(ProcError::InvalidArgument);
        }

        let handle = self.create(name, None, None)?;
        {
            let mut state = self.state.lock();
            state.table.set_root(handle.pid);
            state.table.slot_mut(handle.slot).transition(ProcessState::Runnable);
        }

        log::info!("[proc] root process '{}' is pid {}", name, handle.pid.0);
        Ok(handle.pid)
    }

    /// Reserve a process in Embryo state
    ///
    /// The caller finishes setting up the execution context, then calls
    /// `make_runnable`. The new process is a child of the root process if
    /// one exists.
    pub fn allocate(&self, name: &str) -> Result<ProcessHandle, ProcError> {
        let root = self.state.lock().table.root();
        self.create(name, root, None)
    }

    /// Embryo or Sleeping -> Runnable
    pub fn make_runnable(&self, handle: ProcessHandle) -> Result<(), ProcError> {
        let mut state = self.state.lock();
        if handle.slot >= NPROC {
            return Err(ProcError::NotFound);
        }

        let process = state.table.slot_mut(handle.slot);
        if process.is_unused() || process.pid != handle.pid {
            return Err(ProcError::NotFound);
        }
        match process.state() {
            ProcessState::Embryo | ProcessState::Sleeping => {
                process.transition(ProcessState::Runnable);
                Ok(())
            }
            _ => Err(ProcError::InvalidArgument),
        }
    }

    // ========================================================================
    // SLEEP/WAKEUP AND SIGNALS
    // ========================================================================

    /// Wake every process sleeping on `channel`
    ///
    /// Returns how many were woken. Safe from any context that does not
    /// already hold the table lock.
    pub fn wake_all(&self, channel: Channel) -> usize {
        io_wait::wakeup(&mut self.state.lock().table, channel)
    }

    /// Number of processes sleeping on `channel`
    pub fn waiter_count(&self, channel: Channel) -> usize {
        io_wait::waiter_count(&self.state.lock().table, channel)
    }

    /// Request termination of `pid`
    ///
    /// Advisory: the flag is observed by the process itself. A sleeping
    /// target is made Runnable so that it gets to observe it.
    pub fn signal_kill(&self, pid: ProcessId) -> Result<(), ProcError> {
        let mut state = self.state.lock();
        let Some(process) = state.table.get_mut(pid) else {
            log::warn!("[proc] kill: no process with pid {}", pid.0);
            return Err(ProcError::NotFound);
        };

        process.killed = true;
        if process.state() == ProcessState::Sleeping {
            process.transition(ProcessState::Runnable);
        }
        log::debug!("[proc] pid {} marked killed", pid.0);
        Ok(())
    }

    // ========================================================================
    // POLICY AND PRIORITY
    // ========================================================================

    pub fn policy(&self) -> PolicyId {
        *self.policy.lock()
    }

    /// Switch policies; takes effect at the next round on every CPU
    pub fn set_policy(&self, policy: PolicyId) {
        let old = core::mem::replace(&mut *self.policy.lock(), policy);
        if old != policy {
            log::info!("Scheduling policy: {} -> {}", old.name(), policy.name());
        }
    }

    /// Switch policies by number (0 round-robin, 1 priority, 2 MLFQ)
    pub fn set_policy_raw(&self, raw: u32) -> Result<(), ProcError> {
        let Some(policy) = PolicyId::from_raw(raw) else {
            log::warn!("Rejected unknown scheduling policy {}", raw);
            return Err(ProcError::InvalidArgument);
        };
        self.set_policy(policy);
        Ok(())
    }

    /// Set the static priority of `pid` (0..=100, lower is more urgent)
    pub fn set_priority(&self, pid: ProcessId, priority: u32) -> Result<(), ProcError> {
        let priority = Priority(priority);
        if !priority.is_valid() {
            return Err(ProcError::InvalidArgument);
        }

        let mut state = self.state.lock();
        let process = state.table.get_mut(pid).ok_or(ProcError::NotFound)?;
        process.sched.static_priority = priority;
        Ok(())
    }

    // ========================================================================
    // REPORTING
    // ========================================================================

    /// Execute a closure with access to a live process
    pub fn with_process<F, R>(&self, pid: ProcessId, f: F) -> Option<R>
    where
        F: FnOnce(&Process) -> R,
    {
        self.state.lock().table.get(pid).map(f)
    }

    pub fn process(&self, pid: ProcessId) -> Option<ProcInfo> {
        self.with_process(pid, proc_info)
    }

    /// One consistent listing of every live process, in slot order
    pub fn processes(&self) -> BoundedVec<ProcInfo, NPROC> {
        let state = self.state.lock();
        state
            .table
            .iter()
            .filter(|p| !p.is_unused())
            .map(proc_info)
            .collect()
    }

    /// Log one line per live process, for a console debug key
    pub fn procdump(&self) {
        for info in self.processes() {
            log::info!("{}", info);
        }
    }

    pub fn sysinfo(&self) -> SysInfo {
        let ticks = self.platform.ticks.now();
        SysInfo {
            nproc: self.state.lock().table.live_count(),
            ticks,
        }
    }

    pub fn cpu_stats(&self) -> CpuStats {
        self.state.lock().core.stats()
    }

    /// Process currently dispatched on `cpu`
    pub fn current(&self, cpu: CpuId) -> Option<ProcessId> {
        self.state.lock().core.cpu(cpu).and_then(|c| c.current)
    }

    // ========================================================================
    // MLFQ RECORDER
    // ========================================================================

    pub fn mlfq_start(&self) {
        let now = self.platform.ticks.now();
        let mut state = self.state.lock();
        let KernelState { table, recorder, .. } = &mut *state;
        recorder.start(table, now);
    }

    pub fn mlfq_stop(&self) {
        self.state.lock().recorder.stop();
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().recorder.is_recording()
    }

    /// Copy of the recorded snapshots
    pub fn mlfq_snapshots(&self) -> Vec<MlfqSnapshot> {
        self.state.lock().recorder.snapshots().to_vec()
    }

    /// Live per-level occupancy of Runnable processes
    pub fn queue_status(&self) -> MlfqSnapshot {
        let now = self.platform.ticks.now();
        let state = self.state.lock();
        MlfqSnapshot::capture(&state.table, now, |s| s == ProcessState::Runnable)
    }

    // ========================================================================
    // DEADLOCK DETECTION
    // ========================================================================

    /// Look for a circular wait among sleeping processes
    ///
    /// The graph is built under the table lock; the search runs on the
    /// private copy after the lock is released.
    pub fn detect_deadlock(&self) -> DeadlockInfo {
        let graph = {
            let state = self.state.lock();
            WaitForGraph::build(&state.table, self.platform.locks.as_ref())
        };
        deadlock::detect(&graph)
    }
}

fn proc_info(process: &Process) -> ProcInfo {
    ProcInfo {
        pid: process.pid,
        ppid: process.parent,
        state: process.state(),
        name: process.name.clone(),
        priority: process.sched.static_priority,
        mlfq_level: process.sched.queue_level,
        created_tick: process.sched.created_at_tick,
        cpu_ticks: process.sched.cpu_ticks_consumed,
    }
}
