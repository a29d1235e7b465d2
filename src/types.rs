// src/types.rs

//! Value types shared by the watcher and the sync worker.

use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque token identifying one registered directory.
///
/// Issued by a [`WatchSource`](crate::watch::WatchSource) on registration and
/// used later to reset or invalidate that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub u64);

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of change reported for a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    /// Some notifications were lost. Carries no path information.
    Overflow,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Overflow => "overflow",
        };
        f.write_str(s)
    }
}

/// A single raw notification as delivered by a watch source.
///
/// `name` is relative to the directory of the handle it was delivered on, and
/// is `None` only for [`ChangeKind::Overflow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: ChangeKind,
    pub name: Option<PathBuf>,
}

impl Notification {
    pub fn new(kind: ChangeKind, name: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
        }
    }

    pub fn created(name: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Created, name)
    }

    pub fn modified(name: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Modified, name)
    }

    pub fn deleted(name: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Deleted, name)
    }

    pub fn overflow() -> Self {
        Self {
            kind: ChangeKind::Overflow,
            name: None,
        }
    }
}

/// All pending notifications for one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    pub handle: WatchHandle,
    pub events: Vec<Notification>,
}

impl NotificationBatch {
    pub fn new(handle: WatchHandle, events: Vec<Notification>) -> Self {
        Self { handle, events }
    }
}

/// A notification resolved to an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// What the remote side should do for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
    /// Create or replace the remote object with the file's current bytes.
    Upsert,
    Remove,
}

impl SyncKind {
    /// Map a change kind onto a sync kind. `Overflow` has no sync counterpart.
    pub fn from_change(kind: ChangeKind) -> Option<Self> {
        match kind {
            ChangeKind::Created | ChangeKind::Modified => Some(SyncKind::Upsert),
            ChangeKind::Deleted => Some(SyncKind::Remove),
            ChangeKind::Overflow => None,
        }
    }
}

/// The unit of work placed on the synchronization queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub path: PathBuf,
    pub kind: SyncKind,
}

impl SyncTask {
    pub fn upsert(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SyncKind::Upsert,
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: SyncKind::Remove,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TryFrom<ChangeEvent> for SyncTask {
    type Error = ChangeEvent;

    fn try_from(event: ChangeEvent) -> Result<Self, Self::Error> {
        match SyncKind::from_change(event.kind) {
            Some(kind) => Ok(SyncTask {
                path: event.path,
                kind,
            }),
            None => Err(event),
        }
    }
}
