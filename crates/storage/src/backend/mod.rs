//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for a content-addressed blob store across different backends
//! (local filesystem, S3-compatible services, memory).

mod local;
#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::Result;
use crate::key::content_key;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

/// Content type recorded when a backend has lost track of the real one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Stored bytes plus the content type they should be served with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub content: Bytes,
    pub content_type: String,
}
impl Blob {
    pub fn new(content: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self { content: content.into(), content_type: content_type.into() }
    }

    /// The content-addressed key this blob is stored under.
    pub fn key(&self) -> String {
        content_key(&self.content)
    }
}

/// Outcome of [`StorageBackend::put_if_absent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stored {
    /// Content-addressed key of the blob.
    pub key: String,
    /// `false` when an identical blob was already present and nothing was written.
    pub written: bool,
}

/// Unified interface for storage backends.
///
/// Keys are hex encoded BLAKE3 digests of the blob's content (see
/// [`content_key`](crate::content_key)) and must be validated using
/// [`validate_key`](crate::validate_key) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use favr_storage::{Blob, StorageBackend, error::Result};
///
/// async fn cache_icon(backend: &dyn StorageBackend, png: Vec<u8>) -> Result<String> {
///     let stored = backend.put_if_absent(&Blob::new(png, "image/png")).await?;
///     Ok(stored.key)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Check whether a blob is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound) if nothing
    /// is stored under the key.
    async fn read(&self, key: &str) -> Result<Blob>;

    /// Unconditionally store `blob` under `key`, replacing anything present.
    ///
    /// Callers almost always want [`put_if_absent`](Self::put_if_absent),
    /// which derives the key from the content.
    async fn write(&self, key: &str, blob: &Blob) -> Result<()>;

    /// Store `blob` under its content key, skipping the write when a blob with
    /// the same digest already exists.
    ///
    /// Two concurrent callers may both see the key as absent and both write;
    /// since the bytes are identical that is harmless.
    async fn put_if_absent(&self, blob: &Blob) -> Result<Stored> {
        let key = blob.key();
        if self.exists(&key).await? {
            debug!(backend = self.name(), key = %key, "blob already stored");
            return Ok(Stored { key, written: false });
        }
        self.write(&key, blob).await?;
        debug!(backend = self.name(), key = %key, bytes = blob.content.len(), "blob stored");
        Ok(Stored { key, written: true })
    }
}
