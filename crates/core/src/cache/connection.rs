//! SQLite feed store: opening and configuring the connection.
//!
//! Reads and writes for the store live in `records.rs`.

use std::path::Path;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;
     PRAGMA busy_timeout=5000;";

/// SQLite-backed feed store.
///
/// Cloning shares the same background connection, so clones may be handed
/// to several loaders at once.
#[derive(Clone, Debug)]
pub struct SqliteFeedStore {
    pub(crate) conn: Connection,
}

impl SqliteFeedStore {
    /// Open (or create) the cache database at `path`.
    ///
    /// Missing parent directories are created. Pending migrations are
    /// applied before the store is returned.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        tracing::debug!(path = %path.display(), "opened feed cache database");
        Self::configure(conn).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await.map_err(Error::Database)?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}
