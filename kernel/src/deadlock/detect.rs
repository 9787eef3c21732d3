/*
 * Cycle search over the wait-for graph
 *
 * Three-colour depth-first search with an explicit stack of frames, so the
 * depth is bounded by NPROC and never by the native call stack. Start nodes
 * are tried in pid order and the search stops at the first back edge.
 */

use heapless::Vec as BoundedVec;

use super::graph::WaitForGraph;
use crate::config::NPROC;
use crate::scheduler::process::ProcessId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not discovered yet
    White,
    /// On the DFS stack
    Gray,
    /// Fully explored
    Black,
}

/// One level of the DFS: the node and the next neighbour to examine
struct Frame {
    node: usize,
    cursor: usize,
}

/// First cycle found, as pids in discovery order
pub fn find_cycle(graph: &WaitForGraph) -> Option<BoundedVec<ProcessId, NPROC>> {
    let mut color = [Color::White; NPROC];
    // A node is pushed only while White and turns Gray, so depth <= NPROC.
    let mut stack: BoundedVec<Frame, NPROC> = BoundedVec::new();

    for start in graph.nodes_by_pid() {
        if color[start] != Color::White {
            continue;
        }
        color[start] = Color::Gray;
        let _ = stack.push(Frame {
            node: start,
            cursor: 0,
        });

        while let Some(top) = stack.last_mut() {
            let node = top.node;
            let next = (top.cursor..NPROC).find(|&n| graph.has_edge(node, n));

            let Some(next) = next else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };
            top.cursor = next + 1;

            match color[next] {
                Color::White => {
                    color[next] = Color::Gray;
                    let _ = stack.push(Frame {
                        node: next,
                        cursor: 0,
                    });
                }
                Color::Gray => return Some(cycle_from(&stack, next, graph)),
                Color::Black => {}
            }
        }
    }

    None
}

/// The stack suffix starting at the re-entered node
fn cycle_from(stack: &[Frame], entry: usize, graph: &WaitForGraph) -> BoundedVec<ProcessId, NPROC> {
    let start = stack
        .iter()
        .position(|frame| frame.node == entry)
        .unwrap_or(0);
    stack[start..]
        .iter()
        .map(|frame| graph.pid(frame.node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[(usize, usize)], edges: &[(usize, usize)]) -> WaitForGraph {
        let mut graph = WaitForGraph::new();
        for &(slot, pid) in nodes {
            graph.add_node(slot, ProcessId(pid));
        }
        for &(waiter, holder) in edges {
            graph.add_edge(waiter, holder);
        }
        graph
    }

    #[test]
    fn empty_graph_has_no_cycle() {
        assert_eq!(find_cycle(&WaitForGraph::new()), None);
    }

    #[test]
    fn two_cycle_is_reported() {
        let g = graph(&[(0, 1), (1, 2)], &[(0, 1), (1, 0)]);
        let cycle = find_cycle(&g).unwrap();
        assert_eq!(cycle.as_slice(), &[ProcessId(1), ProcessId(2)]);
    }

    #[test]
    fn diamond_without_back_edge_is_acyclic() {
        let g = graph(
            &[(0, 1), (1, 2), (2, 3), (3, 4)],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
        );
        assert_eq!(find_cycle(&g), None);
    }

    #[test]
    fn start_nodes_follow_pid_order_not_slot_order() {
        // slot 2 holds the smallest pid, so the search starts there
        let g = graph(&[(0, 9), (1, 8), (2, 3)], &[(2, 0), (0, 1), (1, 0)]);
        let cycle = find_cycle(&g).unwrap();
        assert_eq!(cycle.as_slice(), &[ProcessId(9), ProcessId(8)]);
    }

    #[test]
    fn self_edges_are_never_stored() {
        let g = graph(&[(0, 1)], &[(0, 0)]);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(find_cycle(&g), None);
    }

    #[test]
    fn long_chain_does_not_overflow_the_stack() {
        let mut g = WaitForGraph::new();
        for slot in 0..NPROC {
            g.add_node(slot, ProcessId(slot + 1));
            if slot + 1 < NPROC {
                g.add_edge(slot, slot + 1);
            }
        }
        assert_eq!(find_cycle(&g), None);

        g.add_edge(NPROC - 1, 0);
        assert_eq!(find_cycle(&g).unwrap().len(), NPROC);
    }
}
