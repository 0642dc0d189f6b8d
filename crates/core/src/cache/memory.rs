//! Process-local feed store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{CachedFeed, FeedStore, LocalFeedEntry, RetrievalOutcome};
use crate::Error;

/// Keeps the cached record in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryFeedStore {
    record: Mutex<Option<CachedFeed>>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing record.
    pub fn with_record(record: CachedFeed) -> Self {
        Self { record: Mutex::new(Some(record)) }
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> Option<CachedFeed> {
        self.record.lock().await.clone()
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn delete_cached_feed(&self) -> Result<(), Error> {
        self.record.lock().await.take();
        Ok(())
    }

    async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error> {
        *self.record.lock().await = Some(CachedFeed { feed_items: feed, timestamp });
        Ok(())
    }

    async fn retrieve(&self) -> RetrievalOutcome {
        match self.record.lock().await.clone() {
            Some(cached) => RetrievalOutcome::Found { feed: cached.feed_items, timestamp: cached.timestamp },
            None => RetrievalOutcome::Empty,
        }
    }
}
