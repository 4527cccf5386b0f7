use serde::{Deserialize, Serialize};

/// Process identifier type
///
/// Index of a simulated process or a row of the banker matrices.
pub type ProcessId = usize;

/// Node label in the resource allocation graph, e.g. `"P0"` or `"R1"`
pub type NodeLabel = String;

/// Ordered node labels of one concrete cycle, first and last entries equal
pub type CycleWitness = Vec<NodeLabel>;

/// Order in which every process can run to completion
pub type SafeSequence = Vec<ProcessId>;

/// Label used for process `id` in the graph
pub fn process_label(id: ProcessId) -> NodeLabel {
    format!("P{id}")
}

/// Label used for resource type `id` in the graph
pub fn resource_label(id: usize) -> NodeLabel {
    format!("R{id}")
}

/// Represents the type of graph event that occurred
///
/// Every mutation of the shared graph made by the simulation driver is tagged
/// with one of these. `Spawn` and `Exit` bracket a simulated process' lifetime
/// and do not touch the graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Events {
    /// A simulated process started
    Spawn,
    /// Process added a request edge `P -> R`
    Request,
    /// Request edge was turned into an assignment edge `R -> P`
    Acquired,
    /// Process removed its edge for a resource
    Release,
    /// A simulated process finished its demand list
    Exit,
}

/// Represents one deadlock observed by the simulation driver
///
/// Produced whenever the cycle detector finds a cycle right after a mutation.
/// Detection is point-in-time: the cycle existed in the snapshot that was
/// checked, it may already be gone by the time the callback runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlockInfo {
    /// Process whose mutation preceded the detection
    pub process: NodeLabel,
    /// Resource touched by that mutation
    pub resource: NodeLabel,
    /// Kind of mutation that preceded the detection
    pub event: Events,
    /// Cycle witness in edge-traversal order, e.g. `[P0, R2, P1, R1, P0]`
    pub cycle: CycleWitness,
    /// Simulated processes on the cycle, in witness order without repeats
    pub processes: Vec<NodeLabel>,
    /// ISO-8601 timestamp of the detection
    pub timestamp: String,
}

/// Result of a one-shot deadlock check over a resource allocation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagReport {
    pub deadlock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleWitness>,
}

impl RagReport {
    pub fn from_cycle(cycle: Option<CycleWitness>) -> Self {
        RagReport {
            deadlock: cycle.is_some(),
            cycle,
        }
    }
}

/// Result of the banker's safety check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankerReport {
    pub safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<SafeSequence>,
}

impl BankerReport {
    pub fn from_sequence(sequence: Option<SafeSequence>) -> Self {
        BankerReport {
            safe: sequence.is_some(),
            sequence,
        }
    }
}
