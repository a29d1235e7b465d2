// src/watch/source.rs

//! The notification primitive the dispatcher is driven by.
//!
//! Production code uses [`NotifyWatchSource`](super::watcher::NotifyWatchSource);
//! tests drive the dispatcher with a scripted implementation.

use std::path::Path;

use crate::errors::Result;
use crate::types::{NotificationBatch, WatchHandle};

/// Per-directory change notifications.
pub trait WatchSource {
    /// Start reporting changes to the immediate children of `dir`.
    ///
    /// Registering a directory that is already watched returns its existing
    /// handle.
    fn register(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Block until notifications are pending and return those of one handle.
    ///
    /// `None` means the source has shut down and will never deliver again.
    fn next_batch(&mut self) -> Option<NotificationBatch>;

    /// Re-arm `handle` after its batch was processed.
    ///
    /// Returns `false` once the directory is no longer accessible; the handle
    /// is dead from then on.
    fn reset(&mut self, handle: WatchHandle) -> bool;
}
