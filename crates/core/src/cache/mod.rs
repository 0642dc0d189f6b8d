//! Feed cache: store contract, adapters, staleness policy, and the local loader.
//!
//! A store holds at most one [`CachedFeed`] at a time. Adapters:
//!
//! - [`SqliteFeedStore`]: SQLite via tokio-rusqlite, WAL mode, versioned migrations
//! - [`JsonFileFeedStore`]: a single JSON document replaced atomically
//! - [`InMemoryFeedStore`]: process-local, for tests and ephemeral runs

pub mod connection;
pub mod file;
pub mod loader;
pub mod memory;
pub mod migrations;
pub mod policy;
pub mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

pub use crate::Error;
use crate::feed::FeedEntry;

pub use connection::SqliteFeedStore;
pub use file::JsonFileFeedStore;
pub use loader::LocalFeedLoader;
pub use memory::InMemoryFeedStore;
pub use policy::CachePolicy;

/// Storage-side mirror of [`FeedEntry`].
///
/// Kept separate so the persisted format never follows changes to the
/// domain or wire types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFeedEntry {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Url,
}

impl From<&FeedEntry> for LocalFeedEntry {
    fn from(entry: &FeedEntry) -> Self {
        Self {
            id: entry.id,
            description: entry.description.clone(),
            location: entry.location.clone(),
            image_url: entry.image_url.clone(),
        }
    }
}

impl From<LocalFeedEntry> for FeedEntry {
    fn from(local: LocalFeedEntry) -> Self {
        Self { id: local.id, description: local.description, location: local.location, image_url: local.image_url }
    }
}

/// The single persisted snapshot: ordered entries plus capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFeed {
    pub feed_items: Vec<LocalFeedEntry>,
    pub timestamp: DateTime<Utc>,
}

/// Result of asking a store for its record.
#[derive(Debug)]
pub enum RetrievalOutcome {
    /// No record present.
    Empty,
    /// A record exists.
    Found { feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc> },
    /// The store could not answer.
    Failure(Error),
}

impl From<Result<Option<CachedFeed>, Error>> for RetrievalOutcome {
    fn from(result: Result<Option<CachedFeed>, Error>) -> Self {
        match result {
            Ok(Some(cached)) => RetrievalOutcome::Found { feed: cached.feed_items, timestamp: cached.timestamp },
            Ok(None) => RetrievalOutcome::Empty,
            Err(e) => RetrievalOutcome::Failure(e),
        }
    }
}

/// Persistence contract for the feed cache.
///
/// Implementations must tolerate concurrent calls. Ordering between
/// operations is the caller's responsibility.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Remove any cached record. An absent record is not an error.
    async fn delete_cached_feed(&self) -> Result<(), Error>;

    /// Replace the cached record. Either the whole record becomes readable
    /// or the previous state is kept.
    async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error>;

    async fn retrieve(&self) -> RetrievalOutcome;
}

#[async_trait]
impl<T: FeedStore + ?Sized> FeedStore for std::sync::Arc<T> {
    async fn delete_cached_feed(&self) -> Result<(), Error> {
        (**self).delete_cached_feed().await
    }

    async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error> {
        (**self).insert(feed, timestamp).await
    }

    async fn retrieve(&self) -> RetrievalOutcome {
        (**self).retrieve().await
    }
}

/// Convert domain entries to their persisted form.
pub fn to_local(feed: &[FeedEntry]) -> Vec<LocalFeedEntry> {
    feed.iter().map(LocalFeedEntry::from).collect()
}

/// Convert persisted entries back to domain entries.
pub fn to_models(local: Vec<LocalFeedEntry>) -> Vec<FeedEntry> {
    local.into_iter().map(FeedEntry::from).collect()
}
