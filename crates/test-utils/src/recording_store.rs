use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use treesync::errors::TreesyncError;
use treesync::sync::{RemoteFuture, RemoteStore};

/// One attempted remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Put { url: String, body: Vec<u8> },
    Delete { url: String },
}

impl RemoteCall {
    pub fn url(&self) -> &str {
        match self {
            RemoteCall::Put { url, .. } | RemoteCall::Delete { url } => url,
        }
    }
}

/// A [`RemoteStore`] that records every attempt.
///
/// Clones share the same log, so a test can keep one clone and hand the other
/// to the worker. Failing calls are recorded too.
#[derive(Debug, Clone, Default)]
pub struct RecordingRemoteStore {
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    unreachable: Arc<AtomicBool>,
}

impl RecordingRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call against `url` fail.
    pub fn fail_url(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Make every call fail, as if the server were down.
    pub fn set_unreachable(&self, val: bool) {
        self.unreachable.store(val, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RemoteCall) -> treesync::errors::Result<()> {
        let url = call.url().to_string();
        self.calls.lock().unwrap().push(call);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TreesyncError::Other(anyhow!("connection refused: {url}")));
        }
        if self.failing.lock().unwrap().contains(&url) {
            return Err(TreesyncError::Other(anyhow!("500 Internal Server Error: {url}")));
        }
        Ok(())
    }
}

impl RemoteStore for RecordingRemoteStore {
    fn put(&self, url: String, body: Vec<u8>) -> RemoteFuture<'_> {
        let res = self.record(RemoteCall::Put { url, body });
        Box::pin(async move { res })
    }

    fn delete(&self, url: String) -> RemoteFuture<'_> {
        let res = self.record(RemoteCall::Delete { url });
        Box::pin(async move { res })
    }
}
