use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use favr_fetch::{BROWSER_USER_AGENT, DEFAULT_TIMEOUT, DOCUMENT_BYTE_LIMIT, FetchOptions, IMAGE_BYTE_LIMIT, MAX_REDIRECTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "favr")
}

/// Base directory for data the binary keeps between runs.
fn data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf()).unwrap_or_else(|| std::env::temp_dir().join("favr"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    /// Cache hits are redirected to `<public_url>/<object key>` instead of
    /// being served from the blob store.
    pub public_url: Option<Url>,
}

impl Config {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.timeout_ms must be greater than zero".to_string()));
        }
        if self.fetch.image_limit == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.image_limit must be greater than zero".to_string()));
        }
        if self.fetch.document_limit == 0 {
            exn::bail!(ErrorKind::Invalid("fetch.document_limit must be greater than zero".to_string()));
        }
        if let Some(url) = &self.public_url
            && !matches!(url.scheme(), "http" | "https")
        {
            exn::bail!(ErrorKind::Invalid(format!("public_url must be an http(s) URL, got {url}")));
        }
        match &self.storage {
            StorageConfig::Local { path } if !path.is_absolute() => {
                exn::bail!(ErrorKind::Invalid(format!("storage.path must be absolute, got {}", path.display())))
            },
            StorageConfig::S3 { bucket, .. } if bucket.trim().is_empty() => {
                exn::bail!(ErrorKind::Invalid("storage.bucket must not be empty".to_string()))
            },
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-fetch timeout, body included. `FAVR_FETCH_TIMEOUT_MS` overrides
    /// it at the point of use.
    pub timeout_ms: u64,
    pub image_limit: usize,
    pub document_limit: usize,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: u64::try_from(DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            image_limit: IMAGE_BYTE_LIMIT,
            document_limit: DOCUMENT_BYTE_LIMIT,
            user_agent: BROWSER_USER_AGENT.to_string(),
            max_redirects: MAX_REDIRECTS,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.timeout(),
            image_limit: self.image_limit,
            document_limit: self.document_limit,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite database holding the cache metadata.
    pub path: PathBuf,
    /// Skip cache lookups. `FAVR_IGNORE_CACHE=true` does the same per request.
    pub ignore: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { path: data_dir().join("metadata.sqlite"), ignore: false }
    }
}

/// Where icon blobs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Local {
        path: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        key_id: String,
        key_secret: Secret,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local { path: data_dir().join("blobs") }
    }
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(5));
        assert_eq!(config.fetch.options(), FetchOptions::default());
        assert_eq!(config.fetch.max_redirects, 10);
        assert!(!config.cache.ignore);
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }

    #[rstest]
    #[case::zero_timeout(|c: &mut Config| c.fetch.timeout_ms = 0)]
    #[case::zero_image_limit(|c: &mut Config| c.fetch.image_limit = 0)]
    #[case::zero_document_limit(|c: &mut Config| c.fetch.document_limit = 0)]
    #[case::relative_storage(|c: &mut Config| c.storage = StorageConfig::Local { path: "blobs".into() })]
    #[case::ftp_public_url(|c: &mut Config| c.public_url = Some(Url::parse("ftp://icons.example.com").unwrap()))]
    fn test_validate_rejects(#[case] break_it: fn(&mut Config)) {
        let mut config = Config::default();
        break_it(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_secret_not_in_debug() {
        let storage = StorageConfig::S3 {
            bucket: "icons".to_string(),
            prefix: None,
            region: "auto".to_string(),
            endpoint: None,
            key_id: "id".to_string(),
            key_secret: Secret::new("hunter2"),
        };
        assert!(!format!("{storage:?}").contains("hunter2"));
    }
}
