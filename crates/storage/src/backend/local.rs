//! Local filesystem storage backend.
//!
//! Blobs are stored in a configured directory, sharded by the first two hex
//! characters of their key, and accessed via `tokio::fs` for async I/O. The
//! content type of each blob lives in a sidecar file next to it.

use crate::backend::{Blob, DEFAULT_CONTENT_TYPE};
use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_key};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const CONTENT_TYPE_SUFFIX: &str = "type";
const PARTIAL_SUFFIX: &str = "partial";

static PARTIAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use favr_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/var/cache/favr/blobs")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Root directory for the blob store
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists and is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidRoot(format!("{} is not absolute", root.display())));
        }

        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidRoot(format!("{} is not a directory", root.display())));
            }
        } else {
            // Use non-async here; it'll only happen once on startup and it's
            // not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }

        Ok(Self { name: name.into(), root })
    }

    /// Absolute path of the blob stored under `key`: `<root>/<k[..2]>/<key>`.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        let key = validate_key(key)?;
        Ok(self.root.join(&key[..2]).join(key))
    }

    fn content_type_path(blob_path: &Path) -> PathBuf {
        blob_path.with_extension(CONTENT_TYPE_SUFFIX)
    }

    fn partial_path(blob_path: &Path) -> PathBuf {
        let n = PARTIAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        blob_path.with_extension(format!("{}-{n}.{PARTIAL_SUFFIX}", std::process::id()))
    }

    fn map_io_error(e: std::io::Error, key: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(key.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(key.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;
        Ok(fs::try_exists(&path).await.map_err(|e| Self::map_io_error(e, key))?)
    }

    async fn read(&self, key: &str) -> Result<Blob> {
        let path = self.blob_path(key)?;
        let content = fs::read(&path).await.map_err(|e| Self::map_io_error(e, key))?;
        let content_type = match fs::read_to_string(Self::content_type_path(&path)).await {
            Ok(content_type) => content_type.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) => exn::bail!(Self::map_io_error(e, key)),
        };
        Ok(Blob::new(content, content_type))
    }

    async fn write(&self, key: &str, blob: &Blob) -> Result<()> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, key))?;
        }
        // Sidecar first: a blob file that exists always has its content type.
        fs::write(Self::content_type_path(&path), blob.content_type.as_bytes())
            .await
            .map_err(|e| Self::map_io_error(e, key))?;
        let partial = Self::partial_path(&path);
        fs::write(&partial, &blob.content).await.map_err(|e| Self::map_io_error(e, key))?;
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            exn::bail!(Self::map_io_error(e, key));
        }
        Ok(())
    }
}
