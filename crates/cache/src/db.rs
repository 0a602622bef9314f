//! SQLite pool for the metadata store.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Requests do one short lookup each; background writes queue behind the
/// single WAL writer anyway.
const MAX_CONNECTIONS: u32 = 4;
/// Every cache hit also writes `last_access`, so writers regularly wait on
/// each other for a moment.
const BUSY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Pooled connection to the icon metadata database, migrated on open.
///
/// Cheap to clone; hand it to [`Repository`](crate::Repository) to read and
/// write entries.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database file at `path`, creating it if needed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Losing the last few entries on power loss only costs a re-resolve.
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);
        Self::open(SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS), options).await
    }

    /// A private database that lives exactly as long as the pool. Not gated
    /// on `cfg(test)` so downstream crates can use it in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:").busy_timeout(BUSY_TIMEOUT);
        // Each in-memory connection is a separate database: keep exactly one,
        // and never recycle it.
        let pool = SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None);
        Self::open(pool, options).await
    }

    async fn open(pool: SqlitePoolOptions, options: SqliteConnectOptions) -> Result<Self> {
        let pool = pool.connect_with(options).await.or_raise(|| ErrorKind::Database)?;
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        debug!("Metadata database ready");
        Ok(Self { pool })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool once in-flight queries have finished.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count(db: &Database) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM icon_metadata").fetch_one(db.pool()).await.unwrap();
        count
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert_eq!(count(&db).await, 0);
        let (timeout,): (i64,) = sqlx::query_as("PRAGMA busy_timeout").fetch_one(db.pool()).await.unwrap();
        assert_eq!(timeout, 1500);
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_connect_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("metadata.sqlite");
        let db = Database::connect(&path).await.unwrap();
        assert_eq!(count(&db).await, 0);
        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(db.pool()).await.unwrap();
        assert_eq!(mode, "wal");
        db.close().await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopen_keeps_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("metadata.sqlite");
        let db = Database::connect(&path).await.unwrap();
        sqlx::query("INSERT INTO icon_metadata (cache_key, object_key, expiry, last_access) VALUES ('k', 'o', 1, 1)")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;

        // Migrations already applied; opening again must not fail or wipe data.
        let db = Database::connect(&path).await.unwrap();
        assert_eq!(count(&db).await, 1);
        db.close().await;
    }
}
