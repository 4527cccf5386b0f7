use crate::core::types::DeadlockInfo;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

/// Callback invoked for every deadlock the simulation observes
pub type DeadlockCallback = Arc<dyn Fn(DeadlockInfo) + Send + Sync>;

/// Background dispatcher for deadlock reports
///
/// Runs a dedicated thread that receives reports through a channel, executes
/// the registered callback and keeps every report for the run summary. Process
/// threads only pay for a channel send, so a slow callback never delays a
/// graph mutation.
pub(crate) struct Dispatcher {
    /// Channel sender for transmitting deadlock reports
    sender: Sender<DeadlockInfo>,
    /// Background thread handle, yields every report it saw
    thread_handle: JoinHandle<Vec<DeadlockInfo>>,
}

impl Dispatcher {
    /// Create a new dispatcher with a background thread and channel
    pub(crate) fn new(callback: DeadlockCallback) -> Result<Self> {
        let (tx, rx) = channel::<DeadlockInfo>();

        let thread_handle = std::thread::Builder::new()
            .name("deadlock-sim-reports".into())
            .spawn(move || {
                let mut seen = Vec::new();
                while let Ok(info) = rx.recv() {
                    callback(info.clone());
                    seen.push(info);
                }
                seen
            })
            .context("Failed to spawn report dispatcher thread")?;

        Ok(Dispatcher {
            sender: tx,
            thread_handle,
        })
    }

    /// Sender handle for process threads
    pub(crate) fn sender(&self) -> Sender<DeadlockInfo> {
        self.sender.clone()
    }

    /// Wait for every queued report to be handled
    ///
    /// All senders handed out by [`sender`](Self::sender) must be dropped
    /// first, otherwise this blocks forever.
    pub(crate) fn finish(self) -> Result<Vec<DeadlockInfo>> {
        drop(self.sender);
        self.thread_handle
            .join()
            .map_err(|_| anyhow::anyhow!("Deadlock callback panicked"))
    }
}
