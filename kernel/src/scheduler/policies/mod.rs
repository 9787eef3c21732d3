/*
 * Scheduling Policies Module
 *
 * This module contains the scheduling policy implementations.
 * Each policy implements the Scheduler trait; the SchedulerCore keeps one
 * instance of every policy and dispatches through the one selected by the
 * current PolicyId, so the policy can be switched between rounds.
 *
 * Available policies:
 * - RoundRobin: table-order sweep, every Runnable process once per round
 * - Priority: lowest static priority first, with aging
 * - Mlfq: multi-level feedback queue with demotion and periodic boost
 */

pub mod mlfq;
pub mod priority;
pub mod round_robin;

pub use mlfq::MlfqPolicy;
pub use priority::PriorityPolicy;
pub use round_robin::RoundRobinPolicy;
