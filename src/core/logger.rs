//! Event log for simulation runs
//!
//! Every graph mutation made by the simulation driver, plus process spawn and
//! exit, is written as one JSON line together with the edge list right after
//! the mutation and the cycle found on it, if any. Writes happen on a background
//! thread fed through a channel, so logging never runs inside the graph lock or
//! slows a simulated process down.

use crate::core::graph::ResourceAllocationGraph;
use crate::core::types::{CycleWitness, Events, NodeLabel};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;

/// Structure for a single log entry
#[derive(Debug, Serialize, Clone)]
pub struct LogEntry {
    /// Process that performed the action
    pub process: NodeLabel,
    /// Resource involved (empty for spawn/exit)
    pub resource: NodeLabel,
    /// Type of event that occurred
    pub event: Events,
    /// Absolute timestamp of when the event occurred (seconds since Unix Epoch)
    pub timestamp: f64,
    /// Cycle present right after the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleWitness>,
    /// Every edge of the graph right after the event
    pub edges: Vec<(NodeLabel, NodeLabel)>,
}

/// Commands for controlling the async logger thread
#[derive(Debug)]
pub enum LoggerCommand {
    /// Write a log entry to the file
    LogEntry(LogEntry),
    /// Flush all pending entries to disk and signal completion
    Flush(Sender<()>),
}

/// Event logger for recording simulation events
///
/// Cloning is not supported; share it behind an `Arc`.
pub struct EventLogger {
    /// Channel sender for async communication with logger thread
    sender: Sender<LoggerCommand>,
    /// File the entries end up in, after placeholder expansion
    path: PathBuf,
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush logs during EventLogger drop: {e:?}");
        }
    }
}

impl EventLogger {
    /// Create a new logger that writes to the specified file asynchronously
    ///
    /// # Arguments
    /// * `path` - Path to the log file. If the filename contains "{timestamp}",
    ///   it will be replaced with the current timestamp. Missing parent
    ///   directories are created. An existing file is truncated.
    ///
    /// # Errors
    /// Returns an error if the directory or the file could not be created
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();

        if let Some(parent) = path_buf.parent()
            && parent.to_string_lossy() != ""
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        #[allow(clippy::literal_string_with_formatting_args)]
        let file_path = if path_buf.to_string_lossy().contains("{timestamp}") {
            let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(
                path_buf
                    .to_string_lossy()
                    .replace("{timestamp}", &timestamp.to_string()),
            )
        } else {
            path_buf
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Failed to open log file {}", file_path.display()))?;

        let (tx, rx) = channel::<LoggerCommand>();

        thread::Builder::new()
            .name("deadlock-sim-logger".into())
            .spawn(move || async_logger_thread(file, rx))
            .context("Failed to spawn logger thread")?;

        Ok(EventLogger {
            sender: tx,
            path: file_path,
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log a process event together with the graph it produced
    ///
    /// Non-blocking; a failed send is reported and dropped.
    pub fn log_event(
        &self,
        process: &str,
        resource: &str,
        event: Events,
        graph: Option<&ResourceAllocationGraph>,
        cycle: Option<&CycleWitness>,
    ) {
        let now = Utc::now();
        let timestamp = now.timestamp() as f64 + now.timestamp_subsec_micros() as f64 / 1_000_000.0;

        let edges = graph
            .map(|g| {
                g.edges()
                    .into_iter()
                    .map(|(from, to)| (from.to_string(), to.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let entry = LogEntry {
            process: process.to_string(),
            resource: resource.to_string(),
            event,
            timestamp,
            cycle: cycle.cloned(),
            edges,
        };

        if let Err(e) = self.sender.send(LoggerCommand::LogEntry(entry)) {
            eprintln!("Failed to send log entry: {e:?}");
        }
    }

    /// Log a process spawn or exit
    pub fn log_process_event(&self, process: &str, event: Events) {
        self.log_event(process, "", event, None, None);
    }

    /// Force flush all pending log entries to disk
    ///
    /// Blocks until the writer thread confirms.
    ///
    /// # Errors
    /// Returns an error if the writer thread is gone or does not answer in time
    pub fn flush(&self) -> Result<()> {
        let (flush_tx, flush_rx) = channel();
        self.sender
            .send(LoggerCommand::Flush(flush_tx))
            .context("Logger thread is gone")?;

        flush_rx
            .recv_timeout(Duration::from_secs(10))
            .context("Flush operation timed out")
    }
}

/// Writer loop: serialize each entry and write it as one line
fn async_logger_thread(file: File, rx: Receiver<LoggerCommand>) {
    let mut writer = BufWriter::new(file);

    while let Ok(cmd) = rx.recv() {
        match cmd {
            LoggerCommand::LogEntry(entry) => {
                if let Ok(json) = serde_json::to_string(&entry)
                    && let Err(e) = writeln!(writer, "{json}")
                {
                    eprintln!("Logger write error: {e:?}");
                }
            }
            // Entries sent before the flush request are already written
            LoggerCommand::Flush(responder) => {
                if let Err(e) = writer.flush() {
                    eprintln!("Logger flush error: {e:?}");
                }
                let _ = responder.send(());
            }
        }
    }

    if let Err(e) = writer.flush() {
        eprintln!("Logger final flush error: {e:?}");
    }
}
