// src/sync/remote.rs

//! Pluggable remote store abstraction.
//!
//! The worker talks to a `RemoteStore` instead of an HTTP client directly,
//! so tests can record or fail calls without a server.
//!
//! - `HttpRemoteStore` is the production implementation (`reqwest`).
//! - Tests provide stores that record calls or fail on demand.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::trace;

use crate::config::RemoteSection;
use crate::errors::Result;

/// Boxed future returned by [`RemoteStore`] methods.
pub type RemoteFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Where synced files end up.
pub trait RemoteStore: Send + Sync {
    /// Create or replace the object at `url` with `body`.
    fn put(&self, url: String, body: Vec<u8>) -> RemoteFuture<'_>;

    /// Remove the object at `url`.
    fn delete(&self, url: String) -> RemoteFuture<'_>;
}

/// [`RemoteStore`] speaking plain HTTP `PUT` / `DELETE`.
///
/// Any non-success status is reported as an error.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    credentials: Option<(String, String)>,
}

impl HttpRemoteStore {
    pub fn new(remote: &RemoteSection) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()?;

        let credentials = match (&remote.username, &remote.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            credentials,
        })
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }
}

impl RemoteStore for HttpRemoteStore {
    fn put(&self, url: String, body: Vec<u8>) -> RemoteFuture<'_> {
        Box::pin(async move {
            trace!(%url, bytes = body.len(), "sending PUT");
            self.with_auth(self.client.put(&url))
                .body(body)
                .send()
                .await
                .and_then(|r| r.error_for_status())?;
            Ok(())
        })
    }

    fn delete(&self, url: String) -> RemoteFuture<'_> {
        Box::pin(async move {
            trace!(%url, "sending DELETE");
            self.with_auth(self.client.delete(&url))
                .send()
                .await
                .and_then(|r| r.error_for_status())?;
            Ok(())
        })
    }
}
