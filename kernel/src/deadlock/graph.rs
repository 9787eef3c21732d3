/*
 * Wait-for graph
 *
 * Nodes are process-table slots, an edge `waiter -> holder` means the waiter
 * sleeps on a channel whose resource the holder owns. The graph is rebuilt
 * from scratch for every detection request.
 */

use heapless::Vec as BoundedVec;

use crate::config::NPROC;
use crate::platform::LockOwnership;
use crate::scheduler::process::{ProcessId, ProcessState};
use crate::scheduler::table::ProcTable;

pub struct WaitForGraph {
    edges: [[bool; NPROC]; NPROC],
    pids: [ProcessId; NPROC],
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self {
            edges: [[false; NPROC]; NPROC],
            pids: [ProcessId::NONE; NPROC],
        }
    }

    /// Build the graph from the sleeping processes in `table`
    ///
    /// Must run under the table lock. Holder lookups go through `locks` and
    /// may be stale: self-waits and holders that are no longer in the table
    /// produce no edge.
    pub fn build(table: &ProcTable, locks: &dyn LockOwnership) -> Self {
        let mut graph = Self::new();

        for (slot, process) in table.iter().enumerate() {
            if !process.is_unused() {
                graph.add_node(slot, process.pid);
            }
        }

        for (slot, process) in table.iter().enumerate() {
            if process.state() != ProcessState::Sleeping {
                continue;
            }
            let Some(channel) = process.channel() else {
                continue;
            };
            let Some(holder) = locks.holder_of(channel) else {
                continue;
            };
            if holder == process.pid {
                continue;
            }
            if let Some(holder_slot) = table.find(holder) {
                graph.add_edge(slot, holder_slot);
            }
        }

        graph
    }

    pub(crate) fn add_node(&mut self, slot: usize, pid: ProcessId) {
        self.pids[slot] = pid;
    }

    pub(crate) fn add_edge(&mut self, waiter: usize, holder: usize) {
        if waiter != holder {
            self.edges[waiter][holder] = true;
        }
    }

    pub fn has_edge(&self, waiter: usize, holder: usize) -> bool {
        self.edges[waiter][holder]
    }

    pub fn pid(&self, slot: usize) -> ProcessId {
        self.pids[slot]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().filter(|&&edge| edge).count()
    }

    /// Node slots ordered by pid
    pub fn nodes_by_pid(&self) -> BoundedVec<usize, NPROC> {
        let mut nodes: BoundedVec<usize, NPROC> = (0..NPROC)
            .filter(|&slot| self.pids[slot] != ProcessId::NONE)
            .collect();
        nodes.sort_unstable_by_key(|&slot| self.pids[slot]);
        nodes
    }
}

impl Default for WaitForGraph {
    fn default() -> Self {
        Self::new()
    }
}
