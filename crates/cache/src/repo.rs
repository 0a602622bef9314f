//! Metadata store access.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::key::CacheKey;
use crate::models::{CachedMetadata, MetadataRow};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::warn;

pub type MetadataHandle = Arc<dyn MetadataStore + Send + Sync>;

/// Keyed get/set/delete of [`CachedMetadata`].
///
/// Implementations must be safe for many in-flight requests at once.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the metadata stored under `key`, expired or not.
    ///
    /// A stored entry that can no longer be decoded is removed and reported as
    /// absent.
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedMetadata>>;

    /// Insert or replace the metadata stored under `key`.
    async fn set(&self, key: &CacheKey, metadata: &CachedMetadata) -> Result<()>;

    /// Record an access at `at`. Never moves `last_access` backwards, and is a
    /// no-op for keys that are not stored.
    async fn touch(&self, key: &CacheKey, at: UtcDateTime) -> Result<()>;

    async fn delete(&self, key: &CacheKey) -> Result<()>;
}

/// SQLite-backed [`MetadataStore`].
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for Repository {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedMetadata>> {
        let row: Option<MetadataRow> = sqlx::query_as(include_str!("../queries/get.sql"))
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        match CachedMetadata::try_from(row) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) => {
                warn!(cache_key = %key, error = ?err, "discarding undecodable metadata");
                self.delete(key).await?;
                Ok(None)
            },
        }
    }

    async fn set(&self, key: &CacheKey, metadata: &CachedMetadata) -> Result<()> {
        sqlx::query(include_str!("../queries/upsert.sql"))
            .bind(key.as_str())
            .bind(&metadata.object_key)
            .bind(metadata.expiry.unix_timestamp())
            .bind(metadata.last_access.unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn touch(&self, key: &CacheKey, at: UtcDateTime) -> Result<()> {
        sqlx::query(include_str!("../queries/touch.sql"))
            .bind(at.unix_timestamp())
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<()> {
        sqlx::query(include_str!("../queries/delete.sql"))
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
