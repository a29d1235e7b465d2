use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use treesync::errors::{Result, TreesyncError};
use treesync::types::{Notification, NotificationBatch, WatchHandle};
use treesync::watch::WatchSource;

/// Handle delivered for batches addressed to a directory that was never
/// registered.
pub const UNKNOWN_HANDLE: WatchHandle = WatchHandle(0);

#[derive(Debug)]
enum Step {
    Batch(PathBuf, Vec<Notification>),
    Raw(WatchHandle, Vec<Notification>),
    Gone(PathBuf),
}

/// A deterministic [`WatchSource`] for tests.
///
/// - Handles are numbered from 1 in registration order.
/// - Batches are addressed by directory and resolved to the handle that
///   directory has *when the batch is delivered*, so a script can target
///   directories that only get registered while the script runs.
/// - `gone(dir)` kills the directory's current handle: `reset` on it fails
///   from then on, and registering the directory again hands out a fresh
///   handle. Batches addressed to `dir` before that re-registration still
///   arrive on the dead handle.
/// - `next_batch` returns `None` once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedWatchSource {
    handles: HashMap<PathBuf, WatchHandle>,
    next_id: u64,
    script: VecDeque<Step>,
    failing: HashSet<PathBuf>,
    /// Last dead handle per directory, for batches scripted after `gone`.
    retired: HashMap<PathBuf, WatchHandle>,
    dead: HashSet<WatchHandle>,
    registrations: Vec<PathBuf>,
    resets: Vec<WatchHandle>,
}

impl ScriptedWatchSource {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Queue a batch for `dir`.
    pub fn batch(mut self, dir: impl Into<PathBuf>, events: Vec<Notification>) -> Self {
        self.script.push_back(Step::Batch(dir.into(), events));
        self
    }

    /// Queue a batch for an explicit handle.
    pub fn raw(mut self, handle: WatchHandle, events: Vec<Notification>) -> Self {
        self.script.push_back(Step::Raw(handle, events));
        self
    }

    /// At this point in the script, `dir` is removed.
    pub fn gone(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script.push_back(Step::Gone(dir.into()));
        self
    }

    /// Make `register(dir)` fail.
    pub fn fail_on(mut self, dir: impl Into<PathBuf>) -> Self {
        self.failing.insert(dir.into());
        self
    }

    /// Every `register` call, in order, including repeated ones.
    pub fn registrations(&self) -> &[PathBuf] {
        &self.registrations
    }

    pub fn registration_count(&self, dir: &Path) -> usize {
        self.registrations.iter().filter(|d| d.as_path() == dir).count()
    }

    pub fn handle_of(&self, dir: &Path) -> Option<WatchHandle> {
        self.handles.get(dir).copied()
    }

    pub fn resets(&self) -> &[WatchHandle] {
        &self.resets
    }

}

impl WatchSource for ScriptedWatchSource {
    fn register(&mut self, dir: &Path) -> Result<WatchHandle> {
        self.registrations.push(dir.to_path_buf());

        if self.failing.contains(dir) {
            return Err(TreesyncError::Other(anyhow!(
                "permission denied: {}",
                dir.display()
            )));
        }

        if let Some(&handle) = self.handles.get(dir) {
            return Ok(handle);
        }

        let handle = WatchHandle(self.next_id);
        self.next_id += 1;
        self.handles.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn next_batch(&mut self) -> Option<NotificationBatch> {
        loop {
            match self.script.pop_front()? {
                Step::Batch(dir, events) => {
                    let handle = self
                        .handles
                        .get(&dir)
                        .or_else(|| self.retired.get(&dir))
                        .copied()
                        .unwrap_or(UNKNOWN_HANDLE);
                    return Some(NotificationBatch::new(handle, events));
                }
                Step::Raw(handle, events) => {
                    return Some(NotificationBatch::new(handle, events));
                }
                Step::Gone(dir) => {
                    if let Some(handle) = self.handles.remove(&dir) {
                        self.dead.insert(handle);
                        self.retired.insert(dir, handle);
                    }
                }
            }
        }
    }

    fn reset(&mut self, handle: WatchHandle) -> bool {
        self.resets.push(handle);

        !self.dead.contains(&handle) && self.handles.values().any(|h| *h == handle)
    }
}
