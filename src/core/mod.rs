// Core types
pub mod types;
pub use types::*;

// Event log for simulation runs
pub mod logger;
pub use logger::EventLogger;

// Resource allocation graph and its shared store
pub mod graph;

// Cycle detection
pub mod detector;

// Banker's safety check
pub mod banker;

// Text input for the one-shot checks
pub mod input;

// Delays between simulated steps
pub mod pacing;

// Concurrent simulation driver
pub mod simulation;

use crate::render::{RenderDispatcher, Visualizer};
use anyhow::{Context, Result};
use fxhash::FxHashSet;
use graph::GraphStore;
use pacing::PacingConfig;
use simulation::{
    DeadlockCallback, Dispatcher, EdgePolicy, SimulatedProcess, SimulationConfig,
    SimulationContext, SimulationSummary,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

/// Simulation builder
///
/// Collects processes, timing, logging and visualization settings, then runs
/// every process on its own thread against one shared graph.
///
/// ```no_run
/// use deadlock_sim::{EdgePolicy, Simulation};
///
/// let summary = Simulation::new()
///     .process(["R1", "R2"])
///     .process(["R2", "R1"])
///     .edge_policy(EdgePolicy::HoldAndWait)
///     .callback(|info| println!("cycle: {:?}", info.cycle))
///     .run()
///     .expect("simulation failed");
/// assert_eq!(summary.final_edge_count(), 0);
/// ```
pub struct Simulation {
    processes: Vec<SimulatedProcess>,
    edge_policy: EdgePolicy,
    pacing: PacingConfig,
    verbose: bool,
    log_path: Option<PathBuf>,
    callback: DeadlockCallback,
    visualizer: Option<Arc<dyn Visualizer>>,
    store: Option<GraphStore>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create a new simulation with default settings
    ///
    /// By default:
    /// - There are no processes
    /// - Edges follow [`EdgePolicy::RequestRelease`]
    /// - Pacing uses [`PacingConfig::default`]
    /// - Logging and visualization are disabled
    /// - Callback prints each detected cycle
    pub fn new() -> Self {
        Simulation {
            processes: Vec::new(),
            edge_policy: EdgePolicy::default(),
            pacing: PacingConfig::default(),
            verbose: false,
            log_path: None,
            callback: Arc::new(|info: DeadlockInfo| simulation::print_deadlock(&info)),
            visualizer: None,
            store: None,
        }
    }

    /// Create a simulation from a loaded configuration
    pub fn from_config(config: SimulationConfig) -> Self {
        Simulation {
            processes: config.simulated_processes(),
            edge_policy: config.edge_policy,
            pacing: config.pacing,
            verbose: config.verbose,
            ..Self::new()
        }
    }

    /// Add a process labelled `P<n>`, where `n` is the number of processes
    /// added so far
    pub fn process<I, S>(mut self, demands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeLabel>,
    {
        let id = self.processes.len();
        self.processes.push(SimulatedProcess::new(id, demands));
        self
    }

    /// Add a fully specified process
    pub fn with_process(mut self, process: SimulatedProcess) -> Self {
        self.processes.push(process);
        self
    }

    pub fn edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Print every request and release to stdout
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Activate the event log and set the path for the log file
    ///
    /// # Arguments
    /// * `path` - Path to the log file. If the path contains "{timestamp}",
    ///   it will be replaced with the current timestamp.
    pub fn with_log<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set a custom callback to be invoked when a deadlock is detected
    ///
    /// The callback runs on a dedicated dispatcher thread, never on a process
    /// thread.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(DeadlockInfo) + Send + Sync + 'static,
    {
        self.callback = Arc::new(callback);
        self
    }

    /// Hand every post-mutation snapshot to `visualizer`
    pub fn visualizer<V: Visualizer + 'static>(mut self, visualizer: V) -> Self {
        self.visualizer = Some(Arc::new(visualizer));
        self
    }

    /// Run against an existing store instead of a fresh one
    ///
    /// Lets the caller observe the shared graph while the simulation runs.
    pub fn store(mut self, store: GraphStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run every process to completion
    ///
    /// Returns once all process threads have finished and every deadlock
    /// report has gone through the callback.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file cannot be created
    /// - A process, dispatcher or render thread cannot be spawned
    /// - A process thread or the callback panicked
    pub fn run(self) -> Result<SimulationSummary> {
        let logger = match &self.log_path {
            Some(path) => Some(Arc::new(
                EventLogger::with_file(path).context("Failed to initialize logger")?,
            )),
            None => None,
        };

        let renderer = match self.visualizer {
            Some(visualizer) => Some(Arc::new(
                RenderDispatcher::new(visualizer).context("Failed to start render dispatcher")?,
            )),
            None => None,
        };

        let dispatcher = Dispatcher::new(self.callback)?;
        let store = self.store.unwrap_or_default();
        let process_labels: FxHashSet<NodeLabel> =
            self.processes.iter().map(|p| p.label.clone()).collect();

        let ctx = Arc::new(SimulationContext {
            store: store.clone(),
            pacing: self.pacing,
            policy: self.edge_policy,
            process_labels,
            reports: dispatcher.sender(),
            logger: logger.clone(),
            renderer,
            mutations: AtomicUsize::new(0),
            verbose: self.verbose,
        });

        let outcome = simulation::run_processes(ctx, self.processes);

        // Every process thread is joined and the context dropped with it, so
        // the dispatcher sees its channel close
        let reports = dispatcher.finish()?;
        let mutations = outcome?;

        if let Some(logger) = logger {
            logger.flush().context("Failed to flush event log")?;
        }

        Ok(SimulationSummary {
            reports,
            mutations,
            final_graph: store.snapshot(),
        })
    }
}
