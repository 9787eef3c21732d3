/*
 * Priority Scheduling Policy with Aging
 *
 * Runs the Runnable process with the numerically lowest static priority,
 * one process per round. Ties go to the lowest slot.
 *
 * Aging: every Runnable process passed over in a round gains one unit of
 * wait_time (saturating). Once wait_time exceeds the aging threshold the
 * process is promoted by one priority step (floored at 0) and its wait_time
 * restarts. A promoted process replaces the round's pick only if it is now
 * strictly more urgent; a tie keeps the original pick.
 */

use super::super::process::ProcessState;
use super::super::traits::{SchedCtx, Scheduler};
use crate::config::{NPROC, WAIT_TIME_CAP};

/// Priority-based policy
#[derive(Debug, Default)]
pub struct PriorityPolicy;

impl PriorityPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Lowest-priority Runnable slot, earliest slot on ties
    fn best_runnable(ctx: &SchedCtx<'_>) -> Option<usize> {
        (0..NPROC)
            .filter(|&slot| ctx.table.slot(slot).is_runnable())
            .min_by_key(|&slot| ctx.table.slot(slot).sched.static_priority)
    }
}

impl Scheduler for PriorityPolicy {
    fn pick_next(&mut self, ctx: &mut SchedCtx<'_>, prev: Option<usize>) -> Option<usize> {
        if prev.is_some() {
            return None;
        }

        let mut best = Self::best_runnable(ctx)?;
        let threshold = ctx.config.aging_threshold;

        for slot in 0..NPROC {
            if slot == best {
                continue;
            }
            let best_priority = ctx.table.slot(best).sched.static_priority;
            let process = ctx.table.slot_mut(slot);
            if process.state() != ProcessState::Runnable {
                continue;
            }

            let sched = &mut process.sched;
            if sched.wait_time < WAIT_TIME_CAP {
                sched.wait_time += 1;
            }
            if sched.wait_time > threshold {
                sched.static_priority = sched.static_priority.promoted();
                sched.wait_time = 0;
                log::trace!(
                    "[Priority] aged pid {} to priority {}",
                    process.pid.0,
                    sched.static_priority.0
                );
                if sched.static_priority < best_priority {
                    best = slot;
                }
            }
        }

        ctx.table.slot_mut(best).sched.wait_time = 0;
        Some(best)
    }

    fn name(&self) -> &'static str {
        "Priority"
    }
}
