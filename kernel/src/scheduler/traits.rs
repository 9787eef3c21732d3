/*
 * Scheduler Trait Definitions
 *
 * This module separates scheduling policy from mechanism:
 *
 * - Scheduler: The policy interface that each algorithm implements
 * - SchedCtx: What a policy may touch while deciding (the locked table,
 *   the recorder, the tunables and the round's tick)
 *
 * The dispatcher (sched_core) owns the lock and the context switch. Policies
 * never switch contexts and never take locks; they only choose slots and do
 * their own accounting.
 */

use super::recorder::MlfqRecorder;
use super::table::ProcTable;
use crate::config::SchedConfig;

/// Kernel state a policy may read and update during one round
///
/// Only ever built by the dispatcher while it holds the table lock.
pub struct SchedCtx<'a> {
    pub table: &'a mut ProcTable,
    pub recorder: &'a mut MlfqRecorder,
    pub config: &'a SchedConfig,

    /// Tick count read once at the top of the round
    pub now: u64,
}

/// Scheduling policy trait
///
/// One scheduling round on one CPU looks like:
///
/// ```text
/// begin_round
/// loop {
///     slot = pick_next(prev)      // None ends the round
///     <slot runs until it yields, blocks or exits>
///     on_switched(slot)
///     prev = Some(slot)
/// }
/// ```
///
/// A policy that dispatches a single process per round returns None as soon
/// as `prev` is Some.
pub trait Scheduler: Send {
    /// Round-level housekeeping before the first selection
    fn begin_round(&mut self, _ctx: &mut SchedCtx<'_>) {}

    /// Choose the next Runnable slot, or None to end the round
    ///
    /// `prev` is the slot dispatched last in this round, if any. The returned
    /// slot must be Runnable.
    fn pick_next(&mut self, ctx: &mut SchedCtx<'_>, prev: Option<usize>) -> Option<usize>;

    /// Post-run bookkeeping for the slot that just gave the CPU back
    ///
    /// The process is already out of Running (Runnable, Sleeping or Zombie).
    fn on_switched(&mut self, _ctx: &mut SchedCtx<'_>, _slot: usize) {}

    /// Get the policy name for debugging
    fn name(&self) -> &'static str;
}
