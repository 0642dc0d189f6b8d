//! Feed record operations for the SQLite store.
//!
//! The record is split over `feed_cache` (one header row) and `feed_items`
//! (ordered entries). Writes replace both inside a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;
use url::Url;
use uuid::Uuid;

use super::connection::SqliteFeedStore;
use super::{CachedFeed, FeedStore, LocalFeedEntry, RetrievalOutcome};
use crate::Error;

/// Row shape before text columns are decoded.
struct RawItem {
    id: String,
    description: Option<String>,
    location: Option<String>,
    image_url: String,
}

impl RawItem {
    fn decode(self) -> Result<LocalFeedEntry, Error> {
        let id = Uuid::parse_str(&self.id).map_err(|e| Error::CorruptCache(format!("item id {}: {e}", self.id)))?;
        let image_url = Url::parse(&self.image_url)
            .map_err(|e| Error::CorruptCache(format!("image url {}: {e}", self.image_url)))?;
        Ok(LocalFeedEntry { id, description: self.description, location: self.location, image_url })
    }
}

impl SqliteFeedStore {
    /// Read the cached record, if any.
    pub async fn load_record(&self) -> Result<Option<CachedFeed>, Error> {
        self.conn
            .call(|conn| -> Result<Option<CachedFeed>, Error> {
                let timestamp: Option<String> = conn
                    .query_row("SELECT timestamp FROM feed_cache WHERE id = 1", [], |row| row.get(0))
                    .optional()?;

                let Some(timestamp) = timestamp else {
                    return Ok(None);
                };

                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| Error::CorruptCache(format!("timestamp {timestamp}: {e}")))?
                    .with_timezone(&Utc);

                let mut stmt = conn.prepare(
                    "SELECT id, description, location, image_url
                     FROM feed_items WHERE cache_id = 1 ORDER BY position ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(RawItem {
                        id: row.get(0)?,
                        description: row.get(1)?,
                        location: row.get(2)?,
                        image_url: row.get(3)?,
                    })
                })?;

                let mut feed_items = Vec::new();
                for row in rows {
                    feed_items.push(row?.decode()?);
                }

                Ok(Some(CachedFeed { feed_items, timestamp }))
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl FeedStore for SqliteFeedStore {
    async fn delete_cached_feed(&self) -> Result<(), Error> {
        self.conn
            .call(|conn| -> Result<(), Error> {
                let deleted = conn.execute("DELETE FROM feed_cache", [])?;
                tracing::debug!(deleted, "deleted cached feed");
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error> {
        let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM feed_cache", [])?;
                tx.execute("INSERT INTO feed_cache (id, timestamp) VALUES (1, ?1)", params![stamp])?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO feed_items (cache_id, position, id, description, location, image_url)
                         VALUES (1, ?1, ?2, ?3, ?4, ?5)",
                    )?;
                    for (position, item) in feed.iter().enumerate() {
                        stmt.execute(params![
                            position as i64,
                            item.id.to_string(),
                            &item.description,
                            &item.location,
                            item.image_url.as_str(),
                        ])?;
                    }
                }
                tx.commit()?;
                tracing::debug!(items = feed.len(), "inserted cached feed");
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn retrieve(&self) -> RetrievalOutcome {
        self.load_record().await.into()
    }
}
