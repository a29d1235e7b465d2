// src/sync/mod.rs

//! Mirroring queued changes onto the remote store.
//!
//! The dispatcher pushes [`SyncTask`](crate::types::SyncTask)s into the queue
//! from its own thread; the worker drains it on the async runtime and performs
//! one PUT or DELETE per task.

pub mod path_utils;
pub mod queue;
pub mod remote;
pub mod worker;

pub use queue::{sync_queue, SyncReceiver, SyncSender};
pub use remote::{HttpRemoteStore, RemoteFuture, RemoteStore};
pub use worker::{SyncWorker, WorkerStats};
