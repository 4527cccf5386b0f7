//! Visualization handoff for resource allocation graphs
//!
//! The simulation hands every post-mutation snapshot, together with the nodes of
//! the cycle found on it, to a [`RenderDispatcher`]. The dispatcher runs the
//! actual [`Visualizer`] on its own thread, so a slow or failing renderer can
//! never stall or abort the simulation: failures are printed as warnings and
//! otherwise ignored.

pub mod dot;
pub use dot::to_dot;

use crate::core::graph::ResourceAllocationGraph;
use crate::core::types::NodeLabel;
use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Anything that can display a graph with some nodes highlighted
pub trait Visualizer: Send + Sync {
    /// Render `graph`, marking the nodes in `highlight`
    fn visualize(&self, graph: &ResourceAllocationGraph, highlight: &[NodeLabel]) -> Result<()>;
}

impl<F> Visualizer for F
where
    F: Fn(&ResourceAllocationGraph, &[NodeLabel]) -> Result<()> + Send + Sync,
{
    fn visualize(&self, graph: &ResourceAllocationGraph, highlight: &[NodeLabel]) -> Result<()> {
        self(graph, highlight)
    }
}

/// One unit of work for the render thread
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub graph: ResourceAllocationGraph,
    pub highlight: Vec<NodeLabel>,
}

/// Writes DOT files and turns them into PNG images with Graphviz
///
/// Every call overwrites `<output_dir>/<file_stem>.dot` (and `.png`), so a
/// viewer that reloads on change always shows the latest state.
#[derive(Debug, Clone)]
pub struct GraphvizVisualizer {
    /// Directory for the generated files
    pub output_dir: PathBuf,
    /// File name without extension
    pub file_stem: String,
    /// Graphviz executable
    pub dot_binary: String,
    /// Run Graphviz to produce a PNG; otherwise only the DOT file is written
    pub image: bool,
    /// Open the PNG in the platform viewer after rendering
    pub open_viewer: bool,
}

impl Default for GraphvizVisualizer {
    fn default() -> Self {
        GraphvizVisualizer {
            output_dir: PathBuf::from("."),
            file_stem: "rag".to_string(),
            dot_binary: "dot".to_string(),
            image: true,
            open_viewer: false,
        }
    }
}

impl GraphvizVisualizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        GraphvizVisualizer {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn open_viewer(mut self, open: bool) -> Self {
        self.open_viewer = open;
        self
    }

    pub fn image(mut self, image: bool) -> Self {
        self.image = image;
        self
    }

    pub fn dot_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.dot", self.file_stem))
    }

    pub fn png_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.png", self.file_stem))
    }
}

impl Visualizer for GraphvizVisualizer {
    fn visualize(&self, graph: &ResourceAllocationGraph, highlight: &[NodeLabel]) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create render directory {}", self.output_dir.display())
        })?;

        let dot_path = self.dot_path();
        std::fs::write(&dot_path, to_dot(graph, highlight))
            .with_context(|| format!("Failed to write {}", dot_path.display()))?;

        if !self.image {
            return Ok(());
        }

        let png_path = self.png_path();
        let status = Command::new(&self.dot_binary)
            .arg("-Tpng")
            .arg(&dot_path)
            .arg("-o")
            .arg(&png_path)
            .status()
            .with_context(|| {
                format!(
                    "Failed to run Graphviz '{}'. Make sure Graphviz is installed",
                    self.dot_binary
                )
            })?;
        if !status.success() {
            bail!("Graphviz '{}' failed ({status})", self.dot_binary);
        }

        if self.open_viewer {
            webbrowser::open(&png_path.to_string_lossy()).context("Failed to open image viewer")?;
        }
        Ok(())
    }
}

/// Background queue in front of a [`Visualizer`]
///
/// Submitting never blocks. When snapshots arrive faster than they can be
/// rendered, the worker skips to the newest queued one.
pub struct RenderDispatcher {
    sender: Option<Sender<RenderRequest>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RenderDispatcher {
    /// Start the render thread
    ///
    /// # Errors
    /// Returns an error if the thread could not be spawned
    pub fn new(visualizer: Arc<dyn Visualizer>) -> Result<Self> {
        let (tx, rx) = unbounded::<RenderRequest>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_clone = Arc::clone(&cancelled);

        let worker = std::thread::Builder::new()
            .name("deadlock-sim-render".into())
            .spawn(move || render_loop(visualizer, rx, cancelled_clone))
            .context("Failed to spawn render thread")?;

        Ok(RenderDispatcher {
            sender: Some(tx),
            cancelled,
            worker: Some(worker),
        })
    }

    /// Queue a snapshot for rendering; dropped after [`cancel`](Self::cancel)
    pub fn submit(&self, request: RenderRequest) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        if let Some(sender) = &self.sender {
            let _ = sender.send(request);
        }
    }

    /// Discard queued and future requests
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Close the queue and wait for the in-flight render to finish
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            eprintln!("Warning: render thread panicked");
        }
    }
}

impl Drop for RenderDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn render_loop(visualizer: Arc<dyn Visualizer>, rx: Receiver<RenderRequest>, cancelled: Arc<AtomicBool>) {
    while let Ok(mut request) = rx.recv() {
        // Coalesce a burst to its newest snapshot
        while let Ok(newer) = rx.try_recv() {
            request = newer;
        }
        if cancelled.load(Ordering::Acquire) {
            continue;
        }
        if let Err(e) = visualizer.visualize(&request.graph, &request.highlight) {
            eprintln!("Warning: failed to render graph: {e:#}");
        }
    }
}
