//! Decodes the remote feed payload.
//!
//! Wire shape:
//!
//! ```json
//! { "items": [ { "id": "<uuid>", "description": "..", "location": "..", "image": "<url>" } ] }
//! ```
//!
//! `description` and `location` may be omitted or null.

use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use feedstash_core::FeedEntry;

use super::RemoteError;

const OK_200: u16 = 200;

#[derive(Deserialize)]
struct Root {
    items: Vec<RemoteFeedItem>,
}

#[derive(Deserialize)]
struct RemoteFeedItem {
    id: Uuid,
    description: Option<String>,
    location: Option<String>,
    image: Url,
}

impl From<RemoteFeedItem> for FeedEntry {
    fn from(item: RemoteFeedItem) -> Self {
        FeedEntry { id: item.id, description: item.description, location: item.location, image_url: item.image }
    }
}

/// Map a response to feed entries. Only a 200 with a well-formed body succeeds.
pub fn map(body: &[u8], status: u16) -> Result<Vec<FeedEntry>, RemoteError> {
    if status != OK_200 {
        tracing::debug!(status, "unexpected status from feed endpoint");
        return Err(RemoteError::InvalidData);
    }

    let root: Root = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "feed payload did not decode");
        RemoteError::InvalidData
    })?;

    Ok(root.items.into_iter().map(FeedEntry::from).collect())
}
