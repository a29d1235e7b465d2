// src/sync/worker.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{Result, TreesyncError};
use crate::fs::FileSystem;
use crate::sync::path_utils::{relative_str, remote_url};
use crate::sync::queue::SyncReceiver;
use crate::sync::remote::RemoteStore;
use crate::types::{SyncKind, SyncTask};

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub uploaded: u64,
    pub removed: u64,
    pub failed: u64,
}

/// Drains the sync queue and mirrors each task to the remote store.
///
/// Best effort: every task is attempted once. A failure is logged and the
/// task is dropped; it is never retried or re-queued.
pub struct SyncWorker<R: RemoteStore> {
    root: PathBuf,
    endpoint: String,
    store: R,
    fs: Arc<dyn FileSystem>,
    rx: SyncReceiver,
    stats: WorkerStats,
}

impl<R: RemoteStore> std::fmt::Debug for SyncWorker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncWorker")
            .field("root", &self.root)
            .field("endpoint", &self.endpoint)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<R: RemoteStore> SyncWorker<R> {
    pub fn new(
        root: impl Into<PathBuf>,
        endpoint: impl Into<String>,
        store: R,
        fs: Arc<dyn FileSystem>,
        rx: SyncReceiver,
    ) -> Self {
        Self {
            root: root.into(),
            endpoint: endpoint.into(),
            store,
            fs,
            rx,
            stats: WorkerStats::default(),
        }
    }

    /// Process tasks until every sender is dropped and the queue is empty.
    pub async fn run(mut self) -> WorkerStats {
        info!(endpoint = %self.endpoint, "sync worker started");

        while let Some(task) = self.rx.next().await {
            self.handle(task).await;
        }

        info!(stats = ?self.stats, "sync worker stopped");
        self.stats
    }

    /// Attempt a single task, recording the outcome.
    pub async fn handle(&mut self, task: SyncTask) {
        match self.sync(&task).await {
            Ok(()) => match task.kind {
                SyncKind::Upsert => self.stats.uploaded += 1,
                SyncKind::Remove => self.stats.removed += 1,
            },
            Err(err) => {
                self.stats.failed += 1;
                warn!(
                    kind = ?task.kind,
                    path = ?task.path,
                    error = %err,
                    "sync failed; dropping task"
                );
            }
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    async fn sync(&self, task: &SyncTask) -> Result<()> {
        let rel = relative_str(&self.root, &task.path).ok_or_else(|| {
            TreesyncError::Other(anyhow::anyhow!(
                "path {:?} is not under root {:?}",
                task.path,
                self.root
            ))
        })?;
        let url = remote_url(&self.endpoint, &rel);

        match task.kind {
            SyncKind::Remove => {
                info!(%url, "DELETE");
                self.store.delete(url).await
            }
            SyncKind::Upsert => {
                let fs = Arc::clone(&self.fs);
                let path = task.path.clone();
                let body = tokio::task::spawn_blocking(move || fs.read(&path))
                    .await
                    .map_err(anyhow::Error::from)??;
                debug!(%url, bytes = body.len(), "read file");
                info!(%url, "PUT");
                self.store.put(url, body).await
            }
        }
    }
}
