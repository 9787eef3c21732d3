/*
 * Scheduler Core - Mechanism Layer
 *
 * This module implements SchedulerCore and the per-CPU dispatcher loop:
 * 1. Holds one instance of every scheduling policy (Box<dyn Scheduler>)
 * 2. Manages per-CPU scheduling state
 * 3. Runs scheduling rounds: asks the active policy for a slot, switches
 *    to it, takes the table lock back and lets the policy do its accounting
 *
 * The SchedulerCore separates "mechanism" (how to hand a CPU to a process)
 * from "policy" (which process gets it). The active policy is re-read at the
 * top of every round, so a switch takes effect at the next round and never
 * in the middle of one.
 */

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::policies::{MlfqPolicy, PriorityPolicy, RoundRobinPolicy};
use super::process::{ProcessId, ProcessState};
use super::running::RunningProcess;
use super::traits::{SchedCtx, Scheduler};
use super::types::{CpuId, CpuStats, PolicyId};
use super::{Kernel, KernelState};

/// Per-CPU scheduling state
#[derive(Debug)]
pub struct PerCpuSchedState {
    /// Which CPU this state belongs to
    pub cpu_id: CpuId,

    /// Process currently running on this CPU
    pub current: Option<ProcessId>,

    /// Scheduling rounds started
    pub rounds: u64,

    /// Rounds that found nothing runnable
    pub idle_rounds: u64,

    /// Number of processes dispatched
    pub context_switches: u64,
}

impl PerCpuSchedState {
    /// Create new per-CPU state
    pub fn new(cpu_id: CpuId) -> Self {
        Self {
            cpu_id,
            current: None,
            rounds: 0,
            idle_rounds: 0,
            context_switches: 0,
        }
    }
}

/// Scheduler Core - The Mechanism Layer
///
/// Owns the policies and the per-CPU records. Lives inside the kernel state,
/// so everything here runs with the table lock held.
pub struct SchedulerCore {
    /// Indexed by `PolicyId::index()`
    policies: [Box<dyn Scheduler>; 3],

    /// Per-CPU scheduling state
    per_cpu: Vec<PerCpuSchedState>,
}

impl SchedulerCore {
    /// Create a new SchedulerCore managing `cpu_count` CPUs
    pub fn new(cpu_count: usize) -> Self {
        let per_cpu = (0..cpu_count)
            .map(|i| PerCpuSchedState::new(CpuId(i as u32)))
            .collect();

        log::info!("SchedulerCore initialized, managing {} CPU(s)", cpu_count);

        Self {
            policies: [
                Box::new(RoundRobinPolicy::new()),
                Box::new(PriorityPolicy::new()),
                Box::new(MlfqPolicy::new()),
            ],
            per_cpu,
        }
    }

    pub fn cpu_count(&self) -> usize {
        self.per_cpu.len()
    }

    pub fn cpu(&self, cpu: CpuId) -> Option<&PerCpuSchedState> {
        self.per_cpu.get(cpu.as_usize())
    }

    fn cpu_mut(&mut self, cpu: CpuId) -> &mut PerCpuSchedState {
        &mut self.per_cpu[cpu.as_usize()]
    }

    /// Name reported by the policy instance behind `id`
    pub fn policy_name(&self, id: PolicyId) -> &'static str {
        self.policies[id.index()].name()
    }

    /// Counters summed over all CPUs
    pub fn stats(&self) -> CpuStats {
        self.per_cpu.iter().fold(CpuStats::default(), |acc, cpu| CpuStats {
            total_rounds: acc.total_rounds + cpu.rounds,
            idle_rounds: acc.idle_rounds + cpu.idle_rounds,
            context_switches: acc.context_switches + cpu.context_switches,
        })
    }
}

impl KernelState {
    /// Run `f` against the policy `id` with a context over this state
    fn with_policy<R>(
        &mut self,
        id: PolicyId,
        now: u64,
        f: impl FnOnce(&mut dyn Scheduler, &mut SchedCtx<'_>) -> R,
    ) -> R {
        let KernelState {
            table,
            core: sched,
            recorder,
            config,
        } = self;
        let mut ctx = SchedCtx {
            table,
            recorder,
            config,
            now,
        };
        f(sched.policies[id.index()].as_mut(), &mut ctx)
    }

    /// Runnable -> Running on `cpu`
    fn dispatch(&mut self, cpu: CpuId, slot: usize) -> ProcessId {
        let process = self.table.slot_mut(slot);
        process.transition(ProcessState::Running);
        process.sched.cpu_ticks_consumed += 1;
        let pid = process.pid;

        let per_cpu = self.core.cpu_mut(cpu);
        per_cpu.current = Some(pid);
        per_cpu.context_switches += 1;
        pid
    }
}

impl Kernel {
    /// Run one scheduling round on `cpu`
    ///
    /// Returns the number of processes dispatched; 0 means the CPU idled.
    pub fn run_round(&self, cpu: CpuId) -> usize {
        if cpu.as_usize() >= self.cpu_count {
            panic!("scheduling round on unknown CPU {}", cpu.0);
        }

        let policy = *self.policy.lock();
        let now = self.platform.ticks.now();

        let mut state = self.state.lock();
        state.core.cpu_mut(cpu).rounds += 1;
        state.with_policy(policy, now, |p, ctx| p.begin_round(ctx));

        let mut prev = None;
        let mut dispatched = 0;
        loop {
            let picked = state.with_policy(policy, now, |p, ctx| p.pick_next(ctx, prev));
            let Some(slot) = picked else { break };

            let pid = state.dispatch(cpu, slot);
            dispatched += 1;
            log::trace!(
                "[{}] cpu {} -> pid {}",
                state.core.policy_name(policy),
                cpu.0,
                pid.0
            );

            drop(state);
            let mut running = RunningProcess::new(self, cpu, slot, pid);
            self.platform.switch.switch_to(cpu, &mut running);
            state = running.into_handback();

            state.core.cpu_mut(cpu).current = None;
            state.with_policy(policy, now, |p, ctx| p.on_switched(ctx, slot));
            prev = Some(slot);
        }

        if dispatched == 0 {
            state.core.cpu_mut(cpu).idle_rounds += 1;
        }
        dispatched
    }

    /// Per-CPU dispatcher loop
    pub fn run(&self, cpu: CpuId) -> ! {
        log::info!("cpu {}: dispatcher started", cpu.0);
        loop {
            self.run_round(cpu);
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_tracks_each_cpu_and_every_policy() {
        let core = SchedulerCore::new(2);
        assert_eq!(core.cpu_count(), 2);
        assert_eq!(core.cpu(CpuId(1)).map(|c| c.cpu_id), Some(CpuId(1)));
        assert!(core.cpu(CpuId(2)).is_none());
        assert_eq!(core.stats(), CpuStats::default());

        for id in PolicyId::ALL {
            assert_eq!(core.policy_name(id), id.name());
        }
    }
}
