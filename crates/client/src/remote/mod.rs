//! Remote feed loader: one transport GET per load, mapped into feed entries.
//!
//! There is no caching or retry here. Transport failures become
//! [`RemoteError::Connectivity`]; anything the mapper rejects becomes
//! [`RemoteError::InvalidData`].

mod error;
pub mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use url::Url;

use feedstash_core::{FeedEntry, FeedLoader, Liveness};

use crate::transport::Transport;
pub use error::RemoteError;

struct Shared<T> {
    url: Url,
    transport: T,
}

impl<T: Transport> Shared<T> {
    async fn load(&self) -> Result<Vec<FeedEntry>, RemoteError> {
        let response = self.transport.get(&self.url).await.map_err(|e| {
            tracing::debug!(url = %self.url, error = %e, "feed request failed");
            RemoteError::Connectivity
        })?;

        mapper::map(&response.body, response.status)
    }
}

/// Loads the feed from a remote endpoint.
///
/// Dropping the loader stops delivery for pending `spawn_load` calls.
pub struct RemoteFeedLoader<T> {
    shared: Arc<Shared<T>>,
    liveness: Liveness,
}

impl<T: Transport + 'static> RemoteFeedLoader<T> {
    pub fn new(url: Url, transport: T) -> Self {
        Self { shared: Arc::new(Shared { url, transport }), liveness: Liveness::new() }
    }

    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    /// Load on a background task and report through `on_complete`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_load<F>(&self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<FeedEntry>, RemoteError>) + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let token = self.liveness.token();
        tokio::spawn(async move {
            let result = shared.load().await;
            token.deliver(on_complete, result);
        })
    }
}

#[async_trait]
impl<T: Transport + 'static> FeedLoader for RemoteFeedLoader<T> {
    type Error = RemoteError;

    async fn load(&self) -> Result<Vec<FeedEntry>, RemoteError> {
        self.shared.load().await
    }
}
