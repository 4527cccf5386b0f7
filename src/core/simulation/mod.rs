//! Concurrent request/release simulation over a shared graph
//!
//! Each simulated process runs on its own thread and walks its demand list:
//!
//! ```text
//! Idle -> Requesting(r) -> Holding(r) -> Releasing(r) -> [next resource | Done]
//! ```
//!
//! Every edge mutation is a single short critical section on the shared
//! [`GraphStore`]. After each mutation the process takes a fresh snapshot, runs
//! cycle detection on it outside the lock, and reports any cycle found. A
//! report is purely observational: nothing is blocked or rolled back, and the
//! process keeps going. Because detection runs on a snapshot, the reported cycle
//! may already be gone by the time the callback sees it.

mod dispatcher;

pub use dispatcher::DeadlockCallback;
pub(crate) use dispatcher::Dispatcher;

use crate::core::detector::detect_cycle;
use crate::core::graph::{GraphStore, ResourceAllocationGraph};
use crate::core::logger::EventLogger;
use crate::core::pacing::PacingConfig;
use crate::core::types::{CycleWitness, DeadlockInfo, Events, NodeLabel, ProcessId, process_label};
use crate::render::{RenderDispatcher, RenderRequest};
use anyhow::{Result, bail};
use chrono::Utc;
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;

/// How a process records the resources it works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Add `P -> R`, hold, remove `P -> R`, then move to the next resource
    #[default]
    RequestRelease,
    /// Add `P -> R`, hold, turn it into `R -> P` and keep it while requesting
    /// the next resource; release every assignment once the list is done
    ///
    /// The request is turned into an assignment whether or not another process
    /// already holds the resource, so a resource may carry several `R -> P`
    /// edges at once. A reported cycle can therefore disappear without any
    /// process releasing anything.
    HoldAndWait,
}

/// Lifecycle of one simulated process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Requesting(NodeLabel),
    Holding(NodeLabel),
    Releasing(NodeLabel),
    Done,
}

impl ProcessState {
    /// Whether moving from `self` to `next` is a legal step
    pub fn can_advance_to(&self, next: &ProcessState) -> bool {
        use ProcessState::*;
        match (self, next) {
            (Idle, Requesting(_) | Done) => true,
            (Requesting(a), Holding(b)) => a == b,
            (Holding(_), Releasing(_) | Requesting(_)) => true,
            (Releasing(_), Requesting(_) | Releasing(_) | Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Idle => write!(f, "Idle"),
            ProcessState::Requesting(r) => write!(f, "Requesting({r})"),
            ProcessState::Holding(r) => write!(f, "Holding({r})"),
            ProcessState::Releasing(r) => write!(f, "Releasing({r})"),
            ProcessState::Done => write!(f, "Done"),
        }
    }
}

/// A process and the resources it will use, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedProcess {
    pub id: ProcessId,
    pub label: NodeLabel,
    pub demands: Vec<NodeLabel>,
}

impl SimulatedProcess {
    /// Process labelled `P<id>`
    pub fn new<I, S>(id: ProcessId, demands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeLabel>,
    {
        SimulatedProcess {
            id,
            label: process_label(id),
            demands: demands.into_iter().map(Into::into).collect(),
        }
    }
}

/// Configuration of a simulation run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Demand list per process; process `i` is labelled `P<i>`
    pub processes: Vec<Vec<NodeLabel>>,
    pub edge_policy: EdgePolicy,
    pub pacing: PacingConfig,
    /// Print every request and release
    pub verbose: bool,
}

impl SimulationConfig {
    /// Three processes asking for `R1..R3` in a ring, so their demands overlap
    pub fn demo() -> Self {
        SimulationConfig {
            processes: vec![
                vec!["R1".into(), "R2".into()],
                vec!["R2".into(), "R3".into()],
                vec!["R3".into(), "R1".into()],
            ],
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// The configured demand lists as processes
    pub fn simulated_processes(&self) -> Vec<SimulatedProcess> {
        self.processes
            .iter()
            .enumerate()
            .map(|(id, demands)| SimulatedProcess::new(id, demands.iter().cloned()))
            .collect()
    }
}

/// Outcome of a finished simulation
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    /// Every deadlock observed, in the order the dispatcher received them
    pub reports: Vec<DeadlockInfo>,
    /// Number of graph mutations performed
    pub mutations: usize,
    /// Graph left behind once every process finished
    pub final_graph: ResourceAllocationGraph,
}

impl SimulationSummary {
    pub fn deadlock_detected(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn final_edge_count(&self) -> usize {
        self.final_graph.edge_count()
    }
}

/// Everything a process thread shares with the others
pub(crate) struct SimulationContext {
    pub(crate) store: GraphStore,
    pub(crate) pacing: PacingConfig,
    pub(crate) policy: EdgePolicy,
    pub(crate) process_labels: FxHashSet<NodeLabel>,
    pub(crate) reports: Sender<DeadlockInfo>,
    pub(crate) logger: Option<Arc<EventLogger>>,
    pub(crate) renderer: Option<Arc<RenderDispatcher>>,
    pub(crate) mutations: AtomicUsize,
    pub(crate) verbose: bool,
}

impl SimulationContext {
    /// Detect, report, log and render after one mutation
    fn after_mutation(&self, process: &str, resource: &str, event: Events) {
        self.mutations.fetch_add(1, Ordering::Relaxed);

        let graph = self.store.snapshot();
        let cycle = detect_cycle(&graph);

        if let Some(cycle) = &cycle {
            let info = self.deadlock_info(process, resource, event, cycle.clone());
            let _ = self.reports.send(info);
        }

        if let Some(logger) = &self.logger {
            logger.log_event(process, resource, event, Some(&graph), cycle.as_ref());
        }

        if let Some(renderer) = &self.renderer {
            renderer.submit(RenderRequest {
                graph,
                highlight: cycle.unwrap_or_default(),
            });
        }
    }

    fn deadlock_info(
        &self,
        process: &str,
        resource: &str,
        event: Events,
        cycle: CycleWitness,
    ) -> DeadlockInfo {
        let processes: Vec<NodeLabel> = {
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            cycle
                .iter()
                .filter(|node| self.process_labels.contains(*node))
                .filter(|node| seen.insert(node.as_str()))
                .cloned()
                .collect()
        };

        DeadlockInfo {
            process: process.to_string(),
            resource: resource.to_string(),
            event,
            cycle,
            processes,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn log_process_event(&self, process: &str, event: Events) {
        if let Some(logger) = &self.logger {
            logger.log_process_event(process, event);
        }
    }
}

/// State machine driver for one process
struct ProcessRun<'a> {
    ctx: &'a SimulationContext,
    process: &'a SimulatedProcess,
    state: ProcessState,
}

impl<'a> ProcessRun<'a> {
    fn enter(&mut self, next: ProcessState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "{}: illegal transition {} -> {}",
            self.process.label,
            self.state,
            next
        );
        self.state = next;
    }

    fn request(&mut self, resource: &str) {
        let process = self.process;
        let label = process.label.as_str();
        self.enter(ProcessState::Requesting(resource.to_string()));
        self.ctx.store.add_edge(label, resource);
        if self.ctx.verbose {
            println!("[Request] {label} -> {resource}");
        }
        self.ctx.after_mutation(label, resource, Events::Request);
    }

    fn acquire(&mut self, resource: &str) {
        let process = self.process;
        let label = process.label.as_str();
        self.ctx
            .store
            .replace_edge((label, resource), (resource, label));
        if self.ctx.verbose {
            println!("[Acquired] {resource} -> {label}");
        }
        self.ctx.after_mutation(label, resource, Events::Acquired);
    }

    /// Remove this process' edge for `resource`, in whichever direction it has
    fn release(&mut self, resource: &str, assigned: bool) {
        let process = self.process;
        let label = process.label.as_str();
        self.enter(ProcessState::Releasing(resource.to_string()));
        if assigned {
            self.ctx.store.remove_edge(resource, label);
        } else {
            self.ctx.store.remove_edge(label, resource);
        }
        if self.ctx.verbose {
            println!("[Release] {label} -/-> {resource}");
        }
        self.ctx.after_mutation(label, resource, Events::Release);
        self.ctx.pacing.settle();
    }

    fn run(mut self) {
        let process = self.process;
        let mut rng = self.ctx.pacing.rng_for(process.id);
        let mut assigned: Vec<&str> = Vec::new();
        self.ctx.log_process_event(&process.label, Events::Spawn);

        for resource in &process.demands {
            self.request(resource);

            self.enter(ProcessState::Holding(resource.clone()));
            rng.hold(&self.ctx.pacing);

            match self.ctx.policy {
                EdgePolicy::RequestRelease => self.release(resource, false),
                EdgePolicy::HoldAndWait => {
                    self.acquire(resource);
                    assigned.push(resource);
                }
            }
        }

        while let Some(resource) = assigned.pop() {
            self.release(resource, true);
        }

        self.enter(ProcessState::Done);
        self.ctx.log_process_event(&process.label, Events::Exit);
    }
}

/// Run one process' whole demand list against the shared context
pub(crate) fn run_process(ctx: &SimulationContext, process: &SimulatedProcess) {
    ProcessRun {
        ctx,
        process,
        state: ProcessState::Idle,
    }
    .run();
}

/// Spawn one thread per process, wait for all of them, and gather the results
pub(crate) fn run_processes(
    ctx: Arc<SimulationContext>,
    processes: Vec<SimulatedProcess>,
) -> Result<usize> {
    let mut handles = Vec::with_capacity(processes.len());
    let count = processes.len();

    for (i, process) in processes.into_iter().enumerate() {
        let worker_ctx = Arc::clone(&ctx);
        let label = process.label.clone();
        let handle = std::thread::Builder::new()
            .name(format!("process-{label}"))
            .spawn(move || run_process(&worker_ctx, &process));

        match handle {
            Ok(handle) => handles.push((label, handle)),
            Err(e) => {
                // Let already running processes finish before giving up
                join_all(handles);
                bail!("Failed to spawn thread for {label}: {e}");
            }
        }

        if i + 1 < count {
            ctx.pacing.stagger();
        }
    }

    let panicked = join_all(handles);
    if let Some(label) = panicked.first() {
        bail!("Simulated process {label} panicked");
    }
    Ok(ctx.mutations.load(Ordering::Relaxed))
}

/// Join every handle, returning the labels of processes that panicked
fn join_all(handles: Vec<(NodeLabel, std::thread::JoinHandle<()>)>) -> Vec<NodeLabel> {
    handles
        .into_iter()
        .filter_map(|(label, handle)| handle.join().is_err().then_some(label))
        .collect()
}

/// Report a deadlock the way the CLI prints it
pub fn print_deadlock(info: &DeadlockInfo) {
    println!(
        "Deadlock detected after {:?} by {} on {}! Cycle: {}",
        info.event,
        info.process,
        info.resource,
        info.cycle.join(" -> ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn context(policy: EdgePolicy, labels: &[&str]) -> (SimulationContext, std::sync::mpsc::Receiver<DeadlockInfo>) {
        let (tx, rx) = channel();
        let ctx = SimulationContext {
            store: GraphStore::new(),
            pacing: PacingConfig::immediate(),
            policy,
            process_labels: labels.iter().map(|l| l.to_string()).collect(),
            reports: tx,
            logger: None,
            renderer: None,
            mutations: AtomicUsize::new(0),
            verbose: false,
        };
        (ctx, rx)
    }

    #[test]
    fn test_state_transitions() {
        use ProcessState::*;
        let r = || "R1".to_string();
        assert!(Idle.can_advance_to(&Requesting(r())));
        assert!(Idle.can_advance_to(&Done));
        assert!(Requesting(r()).can_advance_to(&Holding(r())));
        assert!(!Requesting(r()).can_advance_to(&Holding("R2".into())));
        assert!(Holding(r()).can_advance_to(&Releasing(r())));
        assert!(Releasing(r()).can_advance_to(&Done));
        assert!(!Holding(r()).can_advance_to(&Done));
        assert!(!Done.can_advance_to(&Idle));
        assert!(!Idle.can_advance_to(&Holding(r())));
    }

    #[test]
    fn test_request_release_leaves_graph_empty() {
        let (ctx, rx) = context(EdgePolicy::RequestRelease, &["P0"]);
        let process = SimulatedProcess::new(0, ["R1", "R2", "R3"]);

        run_process(&ctx, &process);

        assert!(ctx.store.snapshot().is_empty());
        assert_eq!(ctx.mutations.load(Ordering::Relaxed), 6);
        drop(ctx);
        assert!(rx.iter().next().is_none());
    }

    #[test]
    fn test_hold_and_wait_releases_everything() {
        let (ctx, _rx) = context(EdgePolicy::HoldAndWait, &["P0"]);
        let process = SimulatedProcess::new(0, ["R1", "R2"]);

        run_process(&ctx, &process);

        assert!(ctx.store.snapshot().is_empty());
        // request + acquire per resource, one release per assignment
        assert_eq!(ctx.mutations.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_cycle_is_reported_with_process_set() {
        let (ctx, rx) = context(EdgePolicy::RequestRelease, &["P0", "P1"]);
        // P1 already waits on R0 which P0 holds; P0 now requests R1 held by P1
        ctx.store.add_edge("R0", "P0");
        ctx.store.add_edge("P1", "R0");
        ctx.store.add_edge("R1", "P1");

        ctx.store.add_edge("P0", "R1");
        ctx.after_mutation("P0", "R1", Events::Request);
        drop(ctx);

        let info = rx.recv().unwrap();
        assert_eq!(info.process, "P0");
        assert_eq!(info.resource, "R1");
        assert_eq!(info.event, Events::Request);
        assert_eq!(info.cycle.len(), 5);
        assert_eq!(info.cycle.first(), info.cycle.last());

        let mut processes = info.processes.clone();
        processes.sort();
        assert_eq!(processes, ["P0", "P1"]);
    }

    #[test]
    fn test_run_processes_staggers_and_counts() {
        let (mut ctx, _rx) = context(EdgePolicy::RequestRelease, &["P0", "P1", "P2"]);
        ctx.pacing.stagger_ms = 5;
        let store = ctx.store.clone();
        let processes = vec![
            SimulatedProcess::new(0, ["R1", "R2"]),
            SimulatedProcess::new(1, ["R2"]),
            SimulatedProcess::new(2, ["R1"]),
        ];

        let mutations = run_processes(Arc::new(ctx), processes).unwrap();

        assert_eq!(mutations, 8);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_hold_and_wait_assigns_held_resource_again() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_path = temp_dir.path().join("double.log");
        let (mut ctx, _rx) = context(EdgePolicy::HoldAndWait, &["P0"]);
        ctx.logger = Some(Arc::new(EventLogger::with_file(&log_path).unwrap()));
        // R1 is already assigned to a process outside the simulation
        ctx.store.add_edge("R1", "P9");

        run_process(&ctx, &SimulatedProcess::new(0, ["R1"]));
        if let Some(logger) = &ctx.logger {
            logger.flush().unwrap();
        }

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let acquired: serde_json::Value = contents
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .find(|entry| entry["event"] == "Acquired")
            .unwrap();
        let edges = acquired["edges"].as_array().unwrap();
        assert!(edges.contains(&serde_json::json!(["R1", "P9"])));
        assert!(edges.contains(&serde_json::json!(["R1", "P0"])));
        assert_eq!(ctx.store.edge_count(), 1);
    }

    #[test]
    fn test_empty_demand_list() {
        let (ctx, _rx) = context(EdgePolicy::HoldAndWait, &["P0"]);
        run_process(&ctx, &SimulatedProcess::new(0, Vec::<String>::new()));
        assert_eq!(ctx.mutations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_config_from_json() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"processes": [["R1"], ["R1", "R2"]], "edge_policy": "hold_and_wait", "pacing": {"stagger_ms": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.edge_policy, EdgePolicy::HoldAndWait);
        assert_eq!(config.pacing.stagger_ms, 0);
        assert_eq!(config.pacing.min_hold_ms, 400);

        let processes = config.simulated_processes();
        assert_eq!(processes[1].label, "P1");
        assert_eq!(processes[1].demands, ["R1", "R2"]);
    }

    #[test]
    fn test_demo_scenario() {
        let demo = SimulationConfig::demo();
        assert_eq!(demo.processes.len(), 3);
        assert_eq!(demo.edge_policy, EdgePolicy::RequestRelease);
    }
}
