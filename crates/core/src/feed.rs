//! Feed domain types shared by the remote and local loaders.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// One item in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: Uuid,
    pub description: Option<String>,
    pub location: Option<String>,
    pub image_url: Url,
}

/// Something that can produce the current feed.
///
/// Dropping the returned future abandons the result; the callback
/// variants on each loader (`spawn_load`) keep the underlying I/O running
/// and only suppress delivery.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load(&self) -> Result<Vec<FeedEntry>, Self::Error>;
}
