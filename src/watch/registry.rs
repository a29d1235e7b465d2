// src/watch/registry.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::WatchHandle;
use crate::watch::ignore::IgnoreFilter;
use crate::watch::source::WatchSource;

/// Outcome of a [`DirectoryRegistry::register_recursive`] walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Directories that received a handle during this walk, in walk order.
    pub registered: Vec<PathBuf>,
    /// Directories that could not be listed or registered.
    pub skipped: Vec<PathBuf>,
    /// Non-ignored regular files found directly inside `registered`.
    pub files: Vec<PathBuf>,
}

/// Live mapping from watch handle to the directory it watches.
///
/// Owned by the dispatcher; nothing else mutates it.
#[derive(Debug)]
pub struct DirectoryRegistry {
    dirs: HashMap<WatchHandle, PathBuf>,
    filter: IgnoreFilter,
    fs: Arc<dyn FileSystem>,
}

impl DirectoryRegistry {
    pub fn new(filter: IgnoreFilter, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            dirs: HashMap::new(),
            filter,
            fs,
        }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Directory watched through `handle`, if it is still registered.
    pub fn resolve(&self, handle: WatchHandle) -> Option<&Path> {
        self.dirs.get(&handle).map(PathBuf::as_path)
    }

    pub fn handle_for(&self, dir: &Path) -> Option<WatchHandle> {
        self.dirs
            .iter()
            .find(|(_, d)| d.as_path() == dir)
            .map(|(h, _)| *h)
    }

    /// All registered directories, sorted.
    pub fn directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self.dirs.values().map(PathBuf::as_path).collect();
        dirs.sort();
        dirs
    }

    /// Register a single directory.
    ///
    /// Re-registering a directory replaces its entry; a directory never has
    /// two live handles in the map.
    pub fn register_one<S: WatchSource + ?Sized>(
        &mut self,
        source: &mut S,
        dir: &Path,
    ) -> Result<WatchHandle> {
        let handle = source.register(dir)?;

        // Drop any stale handle that still points at this directory.
        self.dirs.retain(|h, d| *h == handle || d.as_path() != dir);

        match self.dirs.insert(handle, dir.to_path_buf()) {
            None => debug!(%handle, ?dir, "register"),
            Some(prev) if prev != dir => debug!(%handle, ?prev, ?dir, "update"),
            Some(_) => {}
        }
        Ok(handle)
    }

    /// Register `root` and every directory below it that the ignore filter
    /// accepts.
    ///
    /// Depth-first, parents before children. Ignored directories are neither
    /// registered nor descended into, and symlinks are not followed.
    /// Directories that vanish or refuse registration are skipped.
    pub fn register_recursive<S: WatchSource + ?Sized>(
        &mut self,
        source: &mut S,
        root: &Path,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if self.filter.should_ignore_path(&dir) {
                debug!(?dir, "ignored directory; not watching");
                continue;
            }
            if !self.fs.is_dir(&dir) {
                debug!(?dir, "no longer a directory; skipping");
                report.skipped.push(dir);
                continue;
            }

            let previous = self.handle_for(&dir);
            let handle = match self.register_one(source, &dir) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(?dir, error = %err, "could not watch directory; skipping");
                    report.skipped.push(dir);
                    continue;
                }
            };
            // A fresh handle for a known path means the old watch died with a
            // previous directory; this one is new as far as contents go.
            let newly = previous != Some(handle);
            if newly {
                report.registered.push(dir.clone());
            }

            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    // Most likely removed between registration and listing.
                    warn!(?dir, error = %err, "could not list directory; skipping its children");
                    continue;
                }
            };

            let mut children = Vec::new();
            for entry in entries {
                if self.fs.is_dir(&entry) {
                    children.push(entry);
                } else if newly
                    && self.fs.is_file(&entry)
                    && !self.filter.should_ignore_path(&entry)
                {
                    report.files.push(entry);
                }
            }
            // Reverse so the first child is visited first.
            stack.extend(children.into_iter().rev());
        }

        if !report.registered.is_empty() {
            info!(
                root = ?root,
                registered = report.registered.len(),
                skipped = report.skipped.len(),
                "registered directories"
            );
        }
        report
    }

    /// Forget `handle`. Returns `true` once no directory is watched anymore.
    pub fn invalidate(&mut self, handle: WatchHandle) -> bool {
        if let Some(dir) = self.dirs.remove(&handle) {
            info!(%handle, ?dir, "directory no longer accessible; stopped watching");
        }
        self.dirs.is_empty()
    }
}
