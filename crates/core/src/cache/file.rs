//! JSON file store.
//!
//! The record lives in one document:
//!
//! ```text
//! { "feedItems": [ { "id", "description"?, "location"?, "imageURL" } ], "timestamp": "<rfc3339>" }
//! ```
//!
//! Writes go to a uniquely named sibling temp file that is synced and then
//! renamed over the target, so readers see either the old record or a new
//! one, and concurrent writers never share a temp file.

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{fs, task};

use super::{CachedFeed, FeedStore, LocalFeedEntry, RetrievalOutcome};
use crate::Error;

/// Feed store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileFeedStore {
    path: PathBuf,
}

impl JsonFileFeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<Option<CachedFeed>, Error> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let cached: CachedFeed = serde_json::from_slice(&bytes)
            .map_err(|e| Error::CorruptCache(format!("{}: {e}", self.path.display())))?;
        Ok(Some(cached))
    }

    async fn write_record(&self, record: &CachedFeed) -> Result<(), Error> {
        let encoded = serde_json::to_vec(record).map_err(|e| Error::Encode(e.to_string()))?;
        let bytes = encoded.len();
        let path = self.path.clone();

        task::spawn_blocking(move || replace_file(&path, &encoded))
            .await
            .map_err(|e| Error::Io(io::Error::other(e)))??;

        tracing::debug!(path = %self.path.display(), bytes, "wrote cache file");
        Ok(())
    }
}

/// Write `contents` to a fresh temp file beside `path`, sync it, and rename
/// it over `path`. Each call gets its own temp file; it is removed if any
/// step fails.
fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new().prefix(".feedstash-").suffix(".tmp").tempfile_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl FeedStore for JsonFileFeedStore {
    async fn delete_cached_feed(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert(&self, feed: Vec<LocalFeedEntry>, timestamp: DateTime<Utc>) -> Result<(), Error> {
        self.write_record(&CachedFeed { feed_items: feed, timestamp }).await
    }

    async fn retrieve(&self) -> RetrievalOutcome {
        self.read_record().await.into()
    }
}
