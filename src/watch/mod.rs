// src/watch/mod.rs

//! Directory watching and change detection.
//!
//! This module is responsible for:
//! - The static ignore rules (`ignore`).
//! - The notification primitive (`source`) and its `notify`-backed
//!   implementation (`watcher`).
//! - Tracking which directories are watched (`registry`).
//! - Turning notifications into sync tasks (`dispatcher`).
//!
//! It does **not** talk to the remote store; it only feeds the sync queue.

pub mod dispatcher;
pub mod ignore;
pub mod registry;
pub mod source;
pub mod watcher;

pub use dispatcher::{DispatchOptions, DispatchOutcome, DispatchStats, EventDispatcher};
pub use ignore::IgnoreFilter;
pub use registry::{DirectoryRegistry, RegistrationReport};
pub use source::WatchSource;
pub use watcher::NotifyWatchSource;
