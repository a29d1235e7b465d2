// src/watch/dispatcher.rs

//! Turns raw directory notifications into sync tasks.
//!
//! The dispatcher owns the watch source and the directory registry and is the
//! only code that touches either. For every notification it:
//! 1. drops `Overflow` outright,
//! 2. resolves the entry name against the handle's directory,
//! 3. applies the path filter, then the kind filter,
//! 4. enqueues `Remove` for deletions and `Upsert` for regular files,
//! 5. registers newly created directories (the walk applies the path filter
//!    to them, so ignored directories are never watched).
//!
//! After each batch the handle is reset; a handle that fails to reset is
//! dropped from the registry, and once the registry is empty the loop ends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{Result, TreesyncError};
use crate::fs::FileSystem;
use crate::sync::SyncSender;
use crate::types::{ChangeEvent, ChangeKind, Notification, NotificationBatch, SyncTask};
use crate::watch::ignore::IgnoreFilter;
use crate::watch::registry::{DirectoryRegistry, RegistrationReport};
use crate::watch::source::WatchSource;

/// Number of batches a path queued by a directory walk stays remembered.
const SEED_WINDOW: u64 = 64;

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Register subdirectories at startup and when they are created.
    pub recursive: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Why [`EventDispatcher::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every watched directory became inaccessible.
    TreeGone,
    /// The watch source stopped delivering notifications.
    SourceClosed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub batches: u64,
    pub enqueued: u64,
    pub overflows: u64,
    /// Directories registered after the initial scan.
    pub registered: u64,
}

pub struct EventDispatcher<S: WatchSource> {
    source: S,
    registry: DirectoryRegistry,
    filter: IgnoreFilter,
    fs: Arc<dyn FileSystem>,
    queue: SyncSender,
    options: DispatchOptions,
    /// Files queued by a directory walk, with the batch number they were
    /// queued in. A later `Created` for the same path is not queued again.
    seeded: HashMap<PathBuf, u64>,
    stats: DispatchStats,
}

impl<S: WatchSource> std::fmt::Debug for EventDispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: WatchSource> EventDispatcher<S> {
    pub fn new(
        source: S,
        filter: IgnoreFilter,
        fs: Arc<dyn FileSystem>,
        queue: SyncSender,
        options: DispatchOptions,
    ) -> Self {
        Self {
            source,
            registry: DirectoryRegistry::new(filter.clone(), Arc::clone(&fs)),
            filter,
            fs,
            queue,
            options,
            seeded: HashMap::new(),
            stats: DispatchStats::default(),
        }
    }

    pub fn registry(&self) -> &DirectoryRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Initial registration of the watched root.
    ///
    /// Fails if not even the root itself could be registered.
    pub fn scan(&mut self, root: &Path) -> Result<RegistrationReport> {
        info!(?root, recursive = self.options.recursive, "scanning");

        let report = if self.options.recursive {
            self.registry.register_recursive(&mut self.source, root)
        } else {
            let mut report = RegistrationReport::default();
            if !self.filter.should_ignore_path(root) {
                match self.registry.register_one(&mut self.source, root) {
                    Ok(_) => report.registered.push(root.to_path_buf()),
                    Err(err) => {
                        warn!(?root, error = %err, "could not watch root");
                        report.skipped.push(root.to_path_buf());
                    }
                }
            }
            report
        };

        if self.registry.is_empty() {
            return Err(TreesyncError::RootNotWatchable(root.to_path_buf()));
        }

        info!(watched = self.registry.len(), "scan done");
        Ok(report)
    }

    /// Process notifications until the tree is gone or the source closes.
    pub fn run(&mut self) -> Result<DispatchOutcome> {
        while let Some(batch) = self.source.next_batch() {
            if !self.process_batch(batch)? {
                info!(stats = ?self.stats, "all watched directories are gone; stopping");
                return Ok(DispatchOutcome::TreeGone);
            }
        }

        info!(stats = ?self.stats, "watch source closed; stopping");
        Ok(DispatchOutcome::SourceClosed)
    }

    /// Handle one batch. Returns `false` when the registry became empty.
    pub fn process_batch(&mut self, batch: NotificationBatch) -> Result<bool> {
        self.stats.batches += 1;
        let handle = batch.handle;

        let Some(base) = self.registry.resolve(handle).map(Path::to_path_buf) else {
            warn!(%handle, events = batch.events.len(), "watch handle not recognised; dropping batch");
            return Ok(true);
        };

        for notification in batch.events {
            self.process_notification(&base, notification)?;
        }

        self.expire_seeded();

        if !self.source.reset(handle) && self.registry.invalidate(handle) {
            return Ok(false);
        }
        Ok(true)
    }

    fn process_notification(&mut self, base: &Path, notification: Notification) -> Result<()> {
        let name = match (notification.kind, notification.name) {
            (ChangeKind::Overflow, _) => {
                self.stats.overflows += 1;
                warn!(dir = ?base, "notifications were lost (overflow); continuing");
                return Ok(());
            }
            (kind, None) => {
                debug!(%kind, dir = ?base, "notification without an entry name; skipping");
                return Ok(());
            }
            (_, Some(name)) => name,
        };

        let event = ChangeEvent {
            path: base.join(name),
            kind: notification.kind,
        };

        // A seed only stands in for the file it was read from. Once that file
        // (or a directory above it) is gone, a later `Created` is a new file.
        if event.kind == ChangeKind::Deleted && !self.seeded.is_empty() {
            let before = self.seeded.len();
            self.seeded.retain(|path, _| !path.starts_with(&event.path));
            if self.seeded.len() != before {
                debug!(path = ?event.path, "seeded path deleted; forgetting seed");
            }
        }

        if self.filter.should_ignore_path(&event.path) {
            debug!(kind = %event.kind, path = ?event.path, "ignored path");
        } else if self.filter.should_ignore_kind(event.kind) {
            debug!(kind = %event.kind, path = ?event.path, "ignored kind");
        } else {
            self.forward(&event)?;
        }

        // Runs whatever the filters said: the walk applies the path filter
        // itself, so an ignored directory still ends up unwatched.
        if event.kind == ChangeKind::Created
            && self.options.recursive
            && self.fs.is_dir(&event.path)
        {
            let report = self
                .registry
                .register_recursive(&mut self.source, &event.path);
            self.stats.registered += report.registered.len() as u64;
            for file in report.files {
                self.seed(file)?;
            }
        }

        Ok(())
    }

    fn forward(&mut self, event: &ChangeEvent) -> Result<()> {
        if event.kind != ChangeKind::Deleted && !self.fs.is_file(&event.path) {
            debug!(kind = %event.kind, path = ?event.path, "not a regular file; not syncing");
            return Ok(());
        }

        if event.kind == ChangeKind::Created && self.seeded.remove(&event.path).is_some() {
            debug!(path = ?event.path, "already queued by directory walk");
            return Ok(());
        }

        match SyncTask::try_from(event.clone()) {
            Ok(task) => {
                debug!(kind = %event.kind, path = ?event.path, "queue");
                self.enqueue(task)
            }
            Err(_) => Ok(()),
        }
    }

    fn seed(&mut self, file: PathBuf) -> Result<()> {
        debug!(path = ?file, "queue file found in new directory");
        self.seeded.insert(file.clone(), self.stats.batches);
        self.enqueue(SyncTask::upsert(file))
    }

    fn expire_seeded(&mut self) {
        let now = self.stats.batches;
        self.seeded.retain(|_, at| now - *at < SEED_WINDOW);
    }

    fn enqueue(&mut self, task: SyncTask) -> Result<()> {
        self.queue.push(task)?;
        self.stats.enqueued += 1;
        Ok(())
    }
}
