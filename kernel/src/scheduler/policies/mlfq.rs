/*
 * Multi-Level Feedback Queue Policy
 *
 * NQUEUE levels, level 0 the most urgent, each with its own time-slice
 * budget from SchedConfig. The "queues" are not separate lists: a process's
 * level is a field on its table slot and selection scans the table per level.
 *
 * - Selection: the first Runnable process at the lowest non-empty level,
 *   lowest slot on ties. One process per round.
 * - Accounting: a process that comes back Runnable has consumed one tick of
 *   its slice. An exhausted slice demotes it one level (never below the
 *   last) and refills the slice with the new level's budget.
 * - Boost: once more than `boost_interval` ticks have passed since the last
 *   boost, every live process goes back to level 0 with a full slice.
 *
 * The recorder is fed from here (periodic snapshots and demotions) but is
 * never consulted for a decision.
 */

use super::super::process::ProcessState;
use super::super::traits::{SchedCtx, Scheduler};
use crate::config::{NPROC, NQUEUE};

/// MLFQ policy state
#[derive(Debug, Default)]
pub struct MlfqPolicy {
    /// Tick of the last global boost
    last_boost_tick: u64,
}

impl MlfqPolicy {
    pub fn new() -> Self {
        Self { last_boost_tick: 0 }
    }

    fn boost(ctx: &mut SchedCtx<'_>) {
        let full_slice = ctx.config.time_slice(0);
        let mut boosted = 0;
        for process in ctx.table.iter_mut() {
            if process.is_unused() {
                continue;
            }
            process.sched.queue_level = 0;
            process.sched.time_slice_remaining = full_slice;
            boosted += 1;
        }
        log::debug!(
            "[MLFQ] priority boost at tick {}: {} process(es) to level 0",
            ctx.now,
            boosted
        );
    }
}

impl Scheduler for MlfqPolicy {
    fn begin_round(&mut self, ctx: &mut SchedCtx<'_>) {
        if ctx.now > self.last_boost_tick.saturating_add(ctx.config.boost_interval) {
            Self::boost(ctx);
            self.last_boost_tick = ctx.now;
        }

        ctx.recorder
            .record_periodic(ctx.table, ctx.now, ctx.config.snapshot_interval);
    }

    fn pick_next(&mut self, ctx: &mut SchedCtx<'_>, prev: Option<usize>) -> Option<usize> {
        if prev.is_some() {
            return None;
        }

        (0..NQUEUE).find_map(|level| {
            (0..NPROC).find(|&slot| {
                let process = ctx.table.slot(slot);
                process.is_runnable() && process.sched.queue_level == level
            })
        })
    }

    fn on_switched(&mut self, ctx: &mut SchedCtx<'_>, slot: usize) {
        let config = ctx.config;
        let process = ctx.table.slot_mut(slot);

        // Sleeping and exited processes keep their remaining slice
        if process.state() != ProcessState::Runnable {
            return;
        }

        let sched = &mut process.sched;
        sched.time_slice_remaining = sched.time_slice_remaining.saturating_sub(1);
        sched.total_runtime += 1;
        if sched.time_slice_remaining > 0 {
            return;
        }

        let old_level = sched.queue_level;
        let new_level = (old_level + 1).min(NQUEUE - 1);
        sched.queue_level = new_level;
        sched.time_slice_remaining = config.time_slice(new_level);

        if new_level != old_level {
            log::debug!(
                "[MLFQ] pid {} demoted to level {}",
                process.pid.0,
                new_level
            );
            ctx.recorder.record(ctx.table, ctx.now);
        }
    }

    fn name(&self) -> &'static str {
        "MLFQ"
    }
}
