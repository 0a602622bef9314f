//! In-memory storage backend for testing.

use crate::backend::Blob;
use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Blobs are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Writes are counted
/// and can be made to fail, so callers can assert on deduplication and on how
/// they degrade when the store is unavailable.
///
/// # Examples
///
/// ```
/// use favr_storage::backend::{MockBackend, StorageBackend};
/// use favr_storage::Blob;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::default();
/// let stored = backend.put_if_absent(&Blob::new(&b"GIF89a"[..], "image/gif")).await?;
/// assert!(backend.exists(&stored.key).await?);
/// assert_eq!(backend.writes(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<String, Blob>>,
    writes: AtomicUsize,
    fail: AtomicBool,
}

impl MockBackend {
    /// Create a mock backend pre-populated with blobs, each stored under its
    /// content key.
    pub fn with_blobs(blobs: impl IntoIterator<Item = Blob>) -> Self {
        let storage = blobs.into_iter().map(|blob| (blob.key(), blob)).collect();
        Self { storage: RwLock::new(storage), ..Self::default() }
    }

    /// Create an empty mock backend with a specific name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Make every subsequent operation fail with a backend error.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of blobs currently stored.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check(&self, key: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::BackendError("mock backend unavailable".to_string()));
        }
        Ok(validate_key(key)?.to_string())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            storage: RwLock::default(),
            writes: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = self.check(key)?;
        Ok(self.storage.read().await.contains_key(&key))
    }

    async fn read(&self, key: &str) -> Result<Blob> {
        let key = self.check(key)?;
        self.storage.read().await.get(&key).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key)))
    }

    async fn write(&self, key: &str, blob: &Blob) -> Result<()> {
        let key = self.check(key)?;
        self.storage.write().await.insert(key, blob.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_key;

    #[tokio::test]
    async fn test_write_and_read() {
        let backend = MockBackend::default();
        let blob = Blob::new(&b"hello"[..], "image/png");
        backend.write(&blob.key(), &blob).await.unwrap();
        assert_eq!(backend.read(&blob.key()).await.unwrap(), blob);
    }

    #[tokio::test]
    async fn test_with_blobs() {
        let backend = MockBackend::with_blobs([Blob::new(&b"a"[..], "image/png"), Blob::new(&b"b"[..], "image/gif")]);
        assert!(backend.exists(&content_key(b"a")).await.unwrap());
        assert!(backend.exists(&content_key(b"b")).await.unwrap());
        assert!(!backend.exists(&content_key(b"c")).await.unwrap());
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let backend = MockBackend::default();
        let err = backend.read(&content_key(b"missing")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_put_if_absent_skips_existing() {
        let backend = MockBackend::default();
        let blob = Blob::new(&b"icon"[..], "image/x-icon");
        assert!(backend.put_if_absent(&blob).await.unwrap().written);
        assert!(!backend.put_if_absent(&blob).await.unwrap().written);
        assert_eq!(backend.writes(), 1);
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_len_and_is_empty() {
        let backend = MockBackend::default();
        assert!(backend.is_empty().await);
        backend.put_if_absent(&Blob::new(&b"data"[..], "image/png")).await.unwrap();
        assert_eq!(backend.len().await, 1);
        assert!(!backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_failing() {
        let backend = MockBackend::with_name("flaky");
        backend.set_failing(true);
        let err = backend.put_if_absent(&Blob::new(&b"x"[..], "image/png")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert!(err.is_retryable());
        backend.set_failing(false);
        assert!(backend.put_if_absent(&Blob::new(&b"x"[..], "image/png")).await.is_ok());
        assert_eq!(backend.name(), "flaky");
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let backend = MockBackend::default();
        assert!(backend.read("../etc/passwd").await.is_err());
        assert!(backend.write("../escape", &Blob::new(&b"bad"[..], "image/png")).await.is_err());
    }
}
