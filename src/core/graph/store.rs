//! Shared, lock-protected handle to the resource allocation graph
//!
//! All simulated processes mutate one graph through clones of the same
//! [`GraphStore`]. Every operation takes the lock for exactly one edge mutation
//! or one copy, so a snapshot always reflects a state that really existed and
//! the lock is never held during cycle detection or a simulated delay.

use crate::core::graph::ResourceAllocationGraph;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a graph shared between threads
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    inner: Arc<Mutex<ResourceAllocationGraph>>,
}

impl GraphStore {
    /// Create a store holding an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing graph
    pub fn from_graph(graph: ResourceAllocationGraph) -> Self {
        GraphStore {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Append `from -> to`
    pub fn add_edge(&self, from: &str, to: &str) {
        self.inner.lock().add_edge(from, to);
    }

    /// Remove one `from -> to`
    ///
    /// Removing an edge that is not there leaves the graph untouched.
    ///
    /// # Returns
    /// Whether an edge was removed
    pub fn remove_edge(&self, from: &str, to: &str) -> bool {
        self.inner.lock().remove_edge(from, to)
    }

    /// Swap one edge for another in a single critical section
    ///
    /// # Returns
    /// Whether `old` was present
    pub fn replace_edge(&self, old: (&str, &str), new: (&str, &str)) -> bool {
        self.inner.lock().replace_edge(old, new)
    }

    /// Consistent point-in-time copy of the graph
    pub fn snapshot(&self) -> ResourceAllocationGraph {
        self.inner.lock().clone()
    }

    /// Number of edges currently stored
    pub fn edge_count(&self) -> usize {
        self.inner.lock().edge_count()
    }
}
