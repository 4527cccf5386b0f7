//! Cycle detection over the resource allocation graph
//!
//! A cycle in a single-instance resource allocation graph is a deadlock. The
//! detector runs a depth-first search over every node, keeping
//!
//! 1. a `visited` set of nodes already reached,
//! 2. an `on_stack` set of nodes on the current search path, and
//! 3. a `parents` map from each discovered node to the node it was reached from.
//!
//! An edge into a node that is still on the path is a back-edge and closes a
//! cycle. The search is iterative, so deep graphs cannot overflow the call stack,
//! and each node is entered at most once, so it always terminates.
//!
//! When several cycles exist, which one is reported depends on node iteration
//! order. Callers must only rely on *some* valid cycle being returned.

mod reconstruct;

pub use reconstruct::{ParentMap, reconstruct};

use crate::core::graph::ResourceAllocationGraph;
use crate::core::types::CycleWitness;
use fxhash::FxHashSet;

/// One level of the explicit DFS stack
struct Frame<'g> {
    node: &'g str,
    /// Index of the next outgoing edge to follow
    next: usize,
}

/// Find one cycle and return it as an ordered node list
///
/// # Returns
/// * `Some(cycle)` - nodes in traversal order, first and last entries equal.
///   A self-loop on `n` is returned as `[n, n]`.
/// * `None` - the graph is acyclic
pub fn detect_cycle(graph: &ResourceAllocationGraph) -> Option<CycleWitness> {
    let mut parents = ParentMap::default();
    let (node, ancestor) = find_back_edge(graph, &mut parents)?;
    Some(reconstruct(&parents, node, ancestor))
}

/// Whether the graph contains any cycle
pub fn has_cycle(graph: &ResourceAllocationGraph) -> bool {
    let mut parents = ParentMap::default();
    find_back_edge(graph, &mut parents).is_some()
}

/// Run the DFS until the first back-edge `node -> ancestor`
///
/// `parents` is filled with the tree edges discovered on the way, which is
/// everything [`reconstruct`] needs to rebuild the cycle.
fn find_back_edge<'g>(
    graph: &'g ResourceAllocationGraph,
    parents: &mut ParentMap<'g>,
) -> Option<(&'g str, &'g str)> {
    let mut visited: FxHashSet<&'g str> = FxHashSet::default();
    let mut on_stack: FxHashSet<&'g str> = FxHashSet::default();
    let mut stack: Vec<Frame<'g>> = Vec::new();

    for root in graph.nodes() {
        if !visited.insert(root) {
            continue;
        }
        on_stack.insert(root);
        stack.push(Frame { node: root, next: 0 });

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let Some(target) = graph.neighbors(node).get(frame.next) else {
                // All edges explored
                on_stack.remove(node);
                stack.pop();
                continue;
            };
            frame.next += 1;
            let target = target.as_str();

            if on_stack.contains(target) {
                return Some((node, target));
            }
            if visited.insert(target) {
                parents.insert(target, node);
                on_stack.insert(target);
                stack.push(Frame {
                    node: target,
                    next: 0,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_is_closed_walk(graph: &ResourceAllocationGraph, cycle: &[String]) -> bool {
        cycle.len() >= 2
            && cycle.first() == cycle.last()
            && cycle.windows(2).all(|w| graph.contains_edge(&w[0], &w[1]))
    }

    #[test]
    fn test_empty_graph_has_no_cycle() {
        let graph = ResourceAllocationGraph::new();
        assert_eq!(detect_cycle(&graph), None);
        assert!(!has_cycle(&graph));
    }

    #[test]
    fn test_chain_has_no_cycle() {
        let graph = ResourceAllocationGraph::from_edges([("P0", "R1"), ("R1", "P1"), ("P1", "R2")]);
        assert_eq!(detect_cycle(&graph), None);
    }

    #[test]
    fn test_four_node_cycle() {
        let graph =
            ResourceAllocationGraph::from_edges([("P0", "R1"), ("R1", "P1"), ("P1", "R2"), ("R2", "P0")]);
        let cycle = detect_cycle(&graph).expect("cycle expected");

        assert_eq!(cycle.len(), 5);
        for node in ["P0", "R1", "P1", "R2"] {
            assert!(cycle.iter().any(|n| n == node), "{node} missing from {cycle:?}");
        }
        assert!(cycle_is_closed_walk(&graph, &cycle));
    }

    #[test]
    fn test_self_loop() {
        let graph = ResourceAllocationGraph::from_edges([("P0", "P0")]);
        assert_eq!(detect_cycle(&graph), Some(vec!["P0".to_string(), "P0".to_string()]));
    }

    #[test]
    fn test_cycle_in_second_component() {
        let graph = ResourceAllocationGraph::from_edges([
            ("P0", "R0"),
            ("P1", "R1"),
            ("R1", "P2"),
            ("P2", "R2"),
            ("R2", "P1"),
        ]);
        let cycle = detect_cycle(&graph).expect("cycle expected");
        assert!(cycle_is_closed_walk(&graph, &cycle));
        assert!(!cycle.iter().any(|n| n == "P0" || n == "R0"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // Two paths into the same node are a cross edge, not a back edge
        let graph = ResourceAllocationGraph::from_edges([
            ("P0", "R1"),
            ("P0", "R2"),
            ("R1", "P1"),
            ("R2", "P1"),
        ]);
        assert!(!has_cycle(&graph));
    }

    #[test]
    fn test_duplicate_edges_tolerated() {
        let graph = ResourceAllocationGraph::from_edges([("P0", "R1"), ("P0", "R1"), ("R1", "P0")]);
        let cycle = detect_cycle(&graph).expect("cycle expected");
        assert!(cycle_is_closed_walk(&graph, &cycle));
    }

    #[test]
    fn test_detection_is_repeatable() {
        let graph = ResourceAllocationGraph::from_edges([
            ("P0", "R1"),
            ("R1", "P1"),
            ("P1", "R0"),
            ("R0", "P0"),
            ("P2", "R2"),
            ("R2", "P2"),
        ]);
        assert_eq!(has_cycle(&graph), has_cycle(&graph));
        assert_eq!(detect_cycle(&graph).is_some(), detect_cycle(&graph).is_some());
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let mut graph = ResourceAllocationGraph::new();
        for i in 0..100_000 {
            graph.add_edge(format!("N{i}"), format!("N{}", i + 1));
        }
        assert!(!has_cycle(&graph));

        graph.add_edge("N100000", "N0");
        let cycle = detect_cycle(&graph).expect("cycle expected");
        assert_eq!(cycle.len(), 100_002);
    }
}
