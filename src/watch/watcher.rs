// src/watch/watcher.rs

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

use crate::errors::Result;
use crate::types::{ChangeKind, Notification, NotificationBatch, WatchHandle};
use crate::watch::source::WatchSource;

/// [`WatchSource`] backed by the platform watcher from `notify`.
///
/// Every registered directory gets its own non-recursive watch, so handles map
/// one-to-one onto directories. The `notify` callback runs on the watcher's
/// own thread and only forwards raw events over a channel; translation into
/// [`NotificationBatch`]es happens on the caller's thread in
/// [`next_batch`](WatchSource::next_batch).
pub struct NotifyWatchSource {
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<Event>>,
    handles: HashMap<PathBuf, WatchHandle>,
    dirs: HashMap<WatchHandle, PathBuf>,
    next_id: u64,
    pending: VecDeque<NotificationBatch>,
}

impl std::fmt::Debug for NotifyWatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyWatchSource")
            .field("watched", &self.dirs.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl NotifyWatchSource {
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();

        // Closure called synchronously by notify whenever an event arrives.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Err(err) = tx.send(res) {
                    // The receiving side is gone; nothing left to report to.
                    eprintln!("treesync: failed to forward notify event: {err}");
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            rx,
            handles: HashMap::new(),
            dirs: HashMap::new(),
            next_id: 1,
            pending: VecDeque::new(),
        })
    }

    /// Like [`next_batch`](WatchSource::next_batch), but gives up after
    /// `timeout` without notifications.
    pub fn next_batch_timeout(&mut self, timeout: Duration) -> Option<NotificationBatch> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(batch) = self.pending.pop_front() {
                return Some(batch);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(remaining) {
                Ok(res) => {
                    self.ingest(res);
                    self.drain_ready();
                }
                Err(mpsc::RecvTimeoutError::Timeout) => return None,
                Err(mpsc::RecvTimeoutError::Disconnected) => return self.pending.pop_front(),
            }
        }
    }

    /// Pull in everything that is already queued without blocking, so events
    /// that arrived together end up in the same batch.
    fn drain_ready(&mut self) {
        while let Ok(res) = self.rx.try_recv() {
            self.ingest(res);
        }
    }

    fn ingest(&mut self, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, paths = ?err.paths, "file watch error");
                return;
            }
        };

        trace!(?event, "received notify event");

        if event.need_rescan() {
            // Rescan events carry no usable path; report them on the oldest
            // live handle.
            if let Some(handle) = self.dirs.keys().min().copied() {
                self.push(handle, Some(Notification::overflow()));
            }
            return;
        }

        for (path, kind) in classify(&event) {
            if kind == ChangeKind::Deleted {
                if let Some(&own) = self.handles.get(&path) {
                    // The OS watch died with the directory, even if a new one
                    // already exists at the same path. Kill the handle now so
                    // `reset` fails and a later `register` watches afresh.
                    self.drop_watch(own);
                    self.push(own, None);
                }
            }

            let Some(parent) = path.parent() else {
                continue;
            };
            let Some(&handle) = self.handles.get(parent) else {
                debug!(?path, "event outside any watched directory; ignoring");
                continue;
            };
            let Some(name) = path.file_name() else {
                continue;
            };
            self.push(handle, Some(Notification::new(kind, name)));
        }
    }

    /// Append to the pending batch of `handle`, creating one if needed.
    fn push(&mut self, handle: WatchHandle, notification: Option<Notification>) {
        if let Some(batch) = self.pending.iter_mut().find(|b| b.handle == handle) {
            batch.events.extend(notification);
            return;
        }
        self.pending
            .push_back(NotificationBatch::new(handle, notification.into_iter().collect()));
    }

    fn forget(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        let dir = self.dirs.remove(&handle)?;
        self.handles.remove(&dir);
        Some(dir)
    }

    fn drop_watch(&mut self, handle: WatchHandle) {
        if let Some(dir) = self.forget(handle) {
            debug!(%handle, ?dir, "watched directory removed");
            // The OS usually drops the watch itself when the directory goes.
            if let Err(err) = self.watcher.unwatch(&dir) {
                trace!(?dir, error = %err, "unwatch after removal failed");
            }
        }
    }
}

impl WatchSource for NotifyWatchSource {
    fn register(&mut self, dir: &Path) -> Result<WatchHandle> {
        if let Some(&handle) = self.handles.get(dir) {
            return Ok(handle);
        }

        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let handle = WatchHandle(self.next_id);
        self.next_id += 1;
        self.handles.insert(dir.to_path_buf(), handle);
        self.dirs.insert(handle, dir.to_path_buf());
        Ok(handle)
    }

    fn next_batch(&mut self) -> Option<NotificationBatch> {
        loop {
            if let Some(batch) = self.pending.pop_front() {
                return Some(batch);
            }
            match self.rx.recv() {
                Ok(res) => {
                    self.ingest(res);
                    self.drain_ready();
                }
                Err(_) => return None,
            }
        }
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        let Some(dir) = self.dirs.get(&handle) else {
            return false;
        };

        let alive = std::fs::symlink_metadata(dir)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if alive {
            return true;
        }

        self.drop_watch(handle);
        false
    }
}

/// Translate one `notify` event into per-path change kinds.
fn classify(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let all = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };

    match &event.kind {
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match &event.paths[..] {
            [from, to, ..] => vec![
                (from.clone(), ChangeKind::Deleted),
                (to.clone(), ChangeKind::Created),
            ],
            _ => Vec::new(),
        },
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if std::fs::symlink_metadata(p).is_ok() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Deleted
                };
                (p.clone(), kind)
            })
            .collect(),
        EventKind::Modify(_) => all(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
