//! Wiring configuration into the service stack.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use favr_cache::{Database, Repository};
use favr_config::{Config, StorageConfig};
use favr_fetch::{Fetcher, ReqwestClient};
use favr_resolve::Resolver;
use favr_service::IconService;
use favr_storage::BackendHandle;
use favr_storage::backend::LocalBackend;
use std::sync::Arc;
use tracing::{debug, instrument};

pub fn resolver(config: &Config) -> Result<Resolver> {
    let client = ReqwestClient::new(config.fetch.max_redirects).or_raise(|| ErrorKind::Client)?;
    Ok(Resolver::new(Fetcher::new(Arc::new(client), config.fetch.options())))
}

#[instrument(skip_all)]
pub async fn storage(config: &StorageConfig) -> Result<BackendHandle> {
    match config {
        StorageConfig::Local { path } => {
            debug!(path = %path.display(), "Using local blob store");
            let backend = LocalBackend::new("local", path).or_raise(|| ErrorKind::Storage)?;
            Ok(Arc::new(backend))
        },
        #[cfg(feature = "s3")]
        StorageConfig::S3 { bucket, prefix, region, endpoint, key_id, key_secret } => {
            debug!(bucket = %bucket, "Using S3 blob store");
            let backend = favr_storage::backend::S3Backend::new(
                "s3",
                bucket,
                prefix.clone(),
                region,
                endpoint.clone(),
                key_id,
                key_secret.expose(),
            )
            .await
            .or_raise(|| ErrorKind::Storage)?;
            Ok(Arc::new(backend))
        },
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => {
            tracing::error!("S3 storage is configured, but this binary was built without the `s3` feature");
            exn::bail!(ErrorKind::Storage)
        },
    }
}

/// The cache-aside service plus the database handle it needs closed on exit.
pub struct App {
    pub service: IconService,
    database: Database,
}

impl App {
    pub async fn build(config: &Config) -> Result<Self> {
        let storage = storage(&config.storage).await?;
        if let Some(parent) = config.cache.path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Cache)?;
        }
        let database = Database::connect(&config.cache.path).await.or_raise(|| ErrorKind::Cache)?;
        let service = IconService::new(resolver(config)?, storage, Arc::new(Repository::from(&database)))
            .with_public_url(config.public_url.clone())
            .with_ignore_cache(config.cache.ignore);
        Ok(Self { service, database })
    }

    /// Let background cache writes finish, then close the database.
    pub async fn shutdown(self) {
        self.service.flush().await;
        self.database.close().await;
    }
}
