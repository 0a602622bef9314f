//! S3-compatible storage backend.
//!
//! Blobs are stored as objects named after their content key, optionally
//! under a key prefix, with the content type kept as the object's
//! `Content-Type` attribute. Works with AWS S3, Backblaze B2, Tigris (Fly.io),
//! MinIO and other S3-compatible services.
//!
//! # Credentials
//!
//! Credentials are provided explicitly via the configuration file.

use crate::backend::{Blob, DEFAULT_CONTENT_TYPE};
use crate::error::{ErrorKind, Result};
use crate::{StorageBackend, validate_key};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
};
use exn::ResultExt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Generous default for concurrent S3 requests.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// S3-compatible storage backend.
///
/// # Examples
///
/// ```no_run
/// use favr_storage::backend::S3Backend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = S3Backend::new(
///     "icons",
///     "my-bucket",
///     Some("favicons/".to_string()),
///     "us-west-004",
///     Some("https://s3.us-west-004.backblazeb2.com".to_string()),
///     "access_key_id",
///     "secret_access_key",
/// ).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl S3Backend {
    /// Create a new S3 storage backend.
    ///
    /// # Arguments
    /// * `name` - A name for this backend (used in logging)
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    pub async fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.map(|p| normalize_prefix(&p)).transpose()?.flatten();
        let region = Region::new(region.into());
        let credentials = Credentials::new(key_id, key_secret, None, None, "favr-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(region)
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            // Use path-style addressing for better compatibility with
            // S3-compatible services (Backblaze, MinIO, etc.)
            .force_path_style(true);
        // Set custom endpoint for non-AWS services
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            bucket: bucket.into(),
            prefix,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        })
    }

    fn object_name(&self, key: &str) -> Result<String> {
        Ok(object_name(self.prefix.as_deref(), validate_key(key)?))
    }

    /// Acquire a rate limiter permit before making an S3 API call.
    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        // unwrap is safe: semaphore is never closed
        self.rate_limiter.clone().acquire_owned().await.unwrap()
    }

    fn map_sdk_error<E, R>(err: &SdkError<E, R>) -> ErrorKind
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                ErrorKind::Network(DisplayErrorContext(err).to_string())
            },
            _ => ErrorKind::BackendError(DisplayErrorContext(err).to_string()),
        }
    }
}

/// Trim slashes off a configured prefix, rejecting traversal segments.
fn normalize_prefix(prefix: &str) -> Result<Option<String>> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.split('/').any(|segment| segment == ".." || segment == "." || segment.contains('\0')) {
        exn::bail!(ErrorKind::InvalidRoot(format!("invalid S3 prefix {prefix:?}")));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

fn object_name(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}/{key}"),
        None => key.to_string(),
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let object = self.object_name(key)?;
        let _permit = self.acquire_permit().await;
        match self.client.head_object().bucket(&self.bucket).key(&object).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => exn::bail!(Self::map_sdk_error(&err)),
        }
    }

    async fn read(&self, key: &str) -> Result<Blob> {
        let object = self.object_name(key)?;
        let _permit = self.acquire_permit().await;
        let output = match self.client.get_object().bucket(&self.bucket).key(&object).send().await {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                exn::bail!(ErrorKind::NotFound(key.to_string()))
            },
            Err(err) => exn::bail!(Self::map_sdk_error(&err)),
        };
        let content_type = output.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
        let content = output
            .body
            .collect()
            .await
            .or_raise(|| ErrorKind::Network(format!("reading body of {object}")))?
            .into_bytes();
        Ok(Blob { content, content_type })
    }

    async fn write(&self, key: &str, blob: &Blob) -> Result<()> {
        let object = self.object_name(key)?;
        let _permit = self.acquire_permit().await;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object)
            .content_type(&blob.content_type)
            .body(ByteStream::from(blob.content.clone()))
            .send()
            .await
            .map_err(|err| Self::map_sdk_error(&err))?;
        Ok(())
    }
}
