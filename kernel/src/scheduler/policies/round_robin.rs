/*
 * Round-Robin Scheduling Policy
 *
 * Sweeps the process table in slot order and runs every Runnable process
 * once per round. There is no per-process state and no protection against
 * starvation beyond the order of the sweep.
 *
 * This is the fallback policy for unknown policy numbers.
 */

use super::super::traits::{SchedCtx, Scheduler};
use crate::config::NPROC;

/// Round-Robin scheduling policy
#[derive(Debug, Default)]
pub struct RoundRobinPolicy;

impl RoundRobinPolicy {
    /// Create a new Round-Robin policy
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for RoundRobinPolicy {
    fn pick_next(&mut self, ctx: &mut SchedCtx<'_>, prev: Option<usize>) -> Option<usize> {
        // Continue the sweep after the slot that ran last
        let start = prev.map_or(0, |slot| slot + 1);
        (start..NPROC).find(|&slot| ctx.table.slot(slot).is_runnable())
    }

    fn name(&self) -> &'static str {
        "Round-Robin"
    }
}
