// src/sync/queue.rs

use tokio::sync::mpsc;
use tracing::trace;

use crate::errors::{Result, TreesyncError};
use crate::types::SyncTask;

/// Create the queue between the dispatcher and the sync worker.
///
/// Unbounded and FIFO. Pushing never blocks, so a slow remote can never stall
/// notification handling; the receiving side suspends while the queue is
/// empty.
pub fn sync_queue() -> (SyncSender, SyncReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncSender { tx }, SyncReceiver { rx })
}

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SyncSender {
    tx: mpsc::UnboundedSender<SyncTask>,
}

impl SyncSender {
    /// Enqueue a task. Fails only once the receiver has been dropped.
    pub fn push(&self, task: SyncTask) -> Result<()> {
        trace!(?task, "enqueue");
        self.tx.send(task).map_err(|_| TreesyncError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half. There is exactly one.
#[derive(Debug)]
pub struct SyncReceiver {
    rx: mpsc::UnboundedReceiver<SyncTask>,
}

impl SyncReceiver {
    /// Wait for the next task.
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn next(&mut self) -> Option<SyncTask> {
        self.rx.recv().await
    }

    /// Blocking variant of [`next`](Self::next) for use outside the runtime.
    ///
    /// Panics if called from within an async context.
    pub fn blocking_next(&mut self) -> Option<SyncTask> {
        self.rx.blocking_recv()
    }

    /// Take the next task if one is already queued.
    pub fn try_next(&mut self) -> Option<SyncTask> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
