//! Graph module for deadlock detection
//!
//! - Resource allocation graph: process/resource nodes with request and assignment edges
//! - Graph store: the shared, lock-protected handle used by simulated processes

pub(crate) mod rag;
pub(crate) mod store;

pub use rag::ResourceAllocationGraph;
pub use store::GraphStore;
