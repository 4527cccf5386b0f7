//! Single-instance Resource Allocation Graph
//!
//! Nodes are labels (`"P0"`, `"R1"`, ...) and edges are stored uniformly in one
//! adjacency list: a request is `P -> R`, an assignment is `R -> P`. Cycle
//! detection only needs directed reachability, so the edge kind is not kept.
//!
//! A node exists as soon as it is an endpoint of some edge. Duplicate edges are
//! kept as separate entries and removed one at a time.

use crate::core::types::NodeLabel;
use fxhash::{FxHashMap, FxHashSet};
use std::fmt;

/// Directed graph of process and resource nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAllocationGraph {
    /// Maps a node to the targets of its outgoing edges, in insertion order.
    /// Nodes without outgoing edges have no key.
    adjacency: FxHashMap<NodeLabel, Vec<NodeLabel>>,
}

impl ResourceAllocationGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to)` pairs, in order
    pub fn from_edges<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<NodeLabel>,
        B: Into<NodeLabel>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Append the edge `from -> to`
    ///
    /// Always appends, so adding an existing edge stores a duplicate.
    pub fn add_edge(&mut self, from: impl Into<NodeLabel>, to: impl Into<NodeLabel>) {
        self.adjacency
            .entry(from.into())
            .or_default()
            .push(to.into());
    }

    /// Remove the first occurrence of `from -> to`
    ///
    /// # Returns
    /// `true` if an edge was removed, `false` if there was no such edge
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let Some(targets) = self.adjacency.get_mut(from) else {
            return false;
        };
        let Some(index) = targets.iter().position(|t| t == to) else {
            return false;
        };
        targets.remove(index);
        if targets.is_empty() {
            self.adjacency.remove(from);
        }
        true
    }

    /// Remove one occurrence of `old` and append `new`
    ///
    /// The new edge is appended even if `old` was not present.
    ///
    /// # Returns
    /// Whether `old` was present
    pub fn replace_edge(&mut self, old: (&str, &str), new: (&str, &str)) -> bool {
        let removed = self.remove_edge(old.0, old.1);
        self.add_edge(new.0, new.1);
        removed
    }

    /// Outgoing neighbours of `node`; empty for unknown nodes
    pub fn neighbors(&self, node: &str) -> &[NodeLabel] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether at least one `from -> to` edge exists
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.neighbors(from).iter().any(|t| t == to)
    }

    /// Every node of the graph, each once
    ///
    /// Sources come first in map order, then targets that have no outgoing
    /// edges in the order they are first met.
    pub fn nodes(&self) -> Vec<&str> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut nodes = Vec::with_capacity(self.adjacency.len() * 2);

        for source in self.adjacency.keys() {
            if seen.insert(source.as_str()) {
                nodes.push(source.as_str());
            }
        }
        for targets in self.adjacency.values() {
            for target in targets {
                if seen.insert(target.as_str()) {
                    nodes.push(target.as_str());
                }
            }
        }
        nodes
    }

    /// Every edge as a `(from, to)` pair, duplicates included
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.adjacency
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from.as_str(), to.as_str())))
            .collect()
    }

    /// Number of stored edges, duplicates included
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Whether the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

impl fmt::Display for ResourceAllocationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources: Vec<&NodeLabel> = self.adjacency.keys().collect();
        sources.sort();

        writeln!(f, "Resource Allocation Graph:")?;
        for source in sources {
            writeln!(f, "{} -> {}", source, self.adjacency[source].join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_remove_leaves_no_edges() {
        let mut graph = ResourceAllocationGraph::new();
        graph.add_edge("P0", "R1");
        assert!(graph.contains_edge("P0", "R1"));

        assert!(graph.remove_edge("P0", "R1"));
        assert!(graph.neighbors("P0").is_empty());
        assert!(graph.is_empty());
        assert_eq!(graph, ResourceAllocationGraph::new());
    }

    #[test]
    fn test_duplicates_removed_one_at_a_time() {
        let mut graph = ResourceAllocationGraph::new();
        graph.add_edge("P0", "R1");
        graph.add_edge("P0", "R1");
        assert_eq!(graph.edge_count(), 2);

        graph.remove_edge("P0", "R1");
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge("P0", "R1"));
    }

    #[test]
    fn test_remove_missing_edge_is_noop() {
        let mut graph = ResourceAllocationGraph::from_edges([("P0", "R1")]);
        assert!(!graph.remove_edge("P0", "R2"));
        assert!(!graph.remove_edge("P9", "R1"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_remove_keeps_other_targets_in_order() {
        let mut graph = ResourceAllocationGraph::from_edges([("P0", "R1"), ("P0", "R2"), ("P0", "R3")]);
        graph.remove_edge("P0", "R2");
        assert_eq!(graph.neighbors("P0"), ["R1", "R3"]);
    }

    #[test]
    fn test_nodes_include_sinks() {
        let graph = ResourceAllocationGraph::from_edges([("P0", "R1"), ("R1", "P1"), ("P1", "R2")]);
        let mut nodes = graph.nodes();
        nodes.sort();
        assert_eq!(nodes, ["P0", "P1", "R1", "R2"]);
        assert!(graph.neighbors("R2").is_empty());
    }

    #[test]
    fn test_replace_edge() {
        let mut graph = ResourceAllocationGraph::from_edges([("P0", "R1")]);
        assert!(graph.replace_edge(("P0", "R1"), ("R1", "P0")));
        assert!(!graph.contains_edge("P0", "R1"));
        assert!(graph.contains_edge("R1", "P0"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_display_sorted() {
        let graph = ResourceAllocationGraph::from_edges([("R1", "P0"), ("P1", "R1"), ("P1", "R2")]);
        assert_eq!(
            graph.to_string(),
            "Resource Allocation Graph:\nP1 -> R1, R2\nR1 -> P0\n"
        );
    }
}
