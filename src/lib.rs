//! # deadlock-sim
//!
//! Operating-system deadlock detection and avoidance over shared resources.
//!
//! Two engines are provided:
//!
//! - A single-instance resource allocation graph with cycle detection that
//!   returns a concrete cycle, not just a yes/no answer
//! - The banker's safety check over max/allocation/available matrices
//!
//! On top of the graph engine sits a concurrent simulation: every simulated
//! process runs on its own thread, mutates one shared graph and checks it for a
//! cycle after every request and release.
//!
//! ## Features
//!
//! - Cycle detection with witness reconstruction
//! - Safe sequence search for the banker's model
//! - Threaded request/release simulation with deadlock callbacks
//! - JSON-lines event log
//! - Graphviz rendering with the cycle highlighted

mod core;
pub use core::{
    DeadlockInfo, EventLogger, Events, Simulation,
    banker::{BankerState, is_safe},
    detector::{ParentMap, detect_cycle, has_cycle, reconstruct},
    graph::{GraphStore, ResourceAllocationGraph},
    input::{parse_banker_state, parse_rag, parse_rag_edges},
    logger::LogEntry,
    pacing::{PacingConfig, ProcessRng},
    simulation::{
        DeadlockCallback, EdgePolicy, ProcessState, SimulatedProcess, SimulationConfig,
        SimulationSummary, print_deadlock,
    },
    types::{
        BankerReport, CycleWitness, NodeLabel, ProcessId, RagReport, SafeSequence, process_label,
        resource_label,
    },
};

pub mod render;
