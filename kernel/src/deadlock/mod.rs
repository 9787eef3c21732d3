/*
 * Deadlock Detector
 *
 * Diagnostic only: builds a wait-for graph from the sleeping processes and
 * the lock-ownership provider, then looks for a circular wait. Nothing is
 * prevented or broken up.
 *
 * The holder lookup is allowed to be racy. A lock released between the
 * graph build and the search can hide a real deadlock (false negative);
 * that is accepted in exchange for never locking anything the provider
 * owns. A detection round always answers found/not found.
 */

pub mod detect;
pub mod graph;

use heapless::Vec as BoundedVec;

use crate::config::NPROC;
use crate::scheduler::process::ProcessId;

pub use detect::find_cycle;
pub use graph::WaitForGraph;

/// Result of a detection round
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeadlockInfo {
    pub found: bool,

    /// Pids of the cycle in discovery order; empty when none was found
    pub cycle: BoundedVec<ProcessId, NPROC>,
}

/// Search `graph` for a circular wait
pub fn detect(graph: &WaitForGraph) -> DeadlockInfo {
    match find_cycle(graph) {
        Some(cycle) => {
            log::warn!("[deadlock] circular wait among {} process(es): {:?}", cycle.len(), cycle);
            DeadlockInfo { found: true, cycle }
        }
        None => DeadlockInfo::default(),
    }
}
