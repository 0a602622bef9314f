use crate::error::{ErrorKind, Result};
use crate::request::IconRequest;
use crate::response::{Effort, Served};
use exn::ResultExt;
use favr_cache::{CacheKey, CachedMetadata, MetadataHandle};
use favr_fetch::expiry::minimum_expiry;
use favr_resolve::Resolver;
use favr_storage::error::ErrorKind as StorageErrorKind;
use favr_storage::{BackendHandle, Blob};
use favr_url::Redacted;
use std::sync::Arc;
use time::UtcDateTime;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, instrument, warn};
use url::Url;

/// Setting this to `true` makes every request skip the cache lookup. Read on
/// every request.
pub const IGNORE_CACHE_ENV: &str = "FAVR_IGNORE_CACHE";

fn ignore_cache_override(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// Cache-aside icon serving.
///
/// A request is first looked up in the metadata store. A fresh entry is served
/// from the blob store (or as a redirect to it, when a public URL is
/// configured) without touching the network. Anything else runs the
/// [`Resolver`] and hands the winning image to a background task that stores
/// it; the response never waits on, or fails because of, that write.
///
/// Background work is tracked: call [`flush`](Self::flush) before shutting
/// down to let it finish.
#[derive(Clone)]
pub struct IconService {
    resolver: Resolver,
    storage: BackendHandle,
    metadata: MetadataHandle,
    public_url: Option<Url>,
    ignore_cache: bool,
    tasks: TaskTracker,
}

impl IconService {
    pub fn new(resolver: Resolver, storage: BackendHandle, metadata: MetadataHandle) -> Self {
        Self { resolver, storage, metadata, public_url: None, ignore_cache: false, tasks: TaskTracker::new() }
    }

    /// Serve cache hits as redirects to `<public_url>/<object key>`.
    pub fn with_public_url(mut self, public_url: Option<Url>) -> Self {
        self.public_url = public_url;
        self
    }

    /// Skip cache lookups regardless of the environment.
    pub fn with_ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = ignore_cache;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn ignore_cache(&self) -> bool {
        self.ignore_cache || ignore_cache_override(std::env::var(IGNORE_CACHE_ENV).ok().as_deref())
    }

    #[instrument(skip_all, fields(url = %Redacted(&request.url), size = %request.size, dpr = %request.dpr))]
    pub async fn serve(&self, request: &IconRequest) -> Result<Served> {
        let key = request.cache_key();
        let now = UtcDateTime::now();
        if self.ignore_cache() {
            debug!(cache_key = %key, "Cache lookup skipped");
        } else if let Some(served) = self.serve_cached(&key, now).await? {
            return Ok(served);
        }
        self.serve_resolved(key, request, now).await
    }

    async fn serve_cached(&self, key: &CacheKey, now: UtcDateTime) -> Result<Option<Served>> {
        let Some(metadata) = self.metadata.get(key).await.or_raise(|| ErrorKind::Metadata)? else {
            debug!(cache_key = %key, "Cache miss");
            return Ok(None);
        };
        if metadata.is_expired(now) {
            debug!(cache_key = %key, "Cached icon expired");
            self.forget(key).await;
            return Ok(None);
        }
        self.touch(key.clone(), now);

        if let Some(public_url) = &self.public_url {
            let location = public_location(public_url, &metadata.object_key)?;
            debug!(cache_key = %key, "Cache hit, redirecting");
            return Ok(Some(Served::Redirect { location, expiry: metadata.expiry }));
        }
        match self.storage.read(&metadata.object_key).await {
            Ok(blob) => {
                debug!(cache_key = %key, bytes = blob.content.len(), "Cache hit");
                Ok(Some(Served::Image { blob, expiry: metadata.expiry, effort: Effort::Cached }))
            },
            Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => {
                warn!(cache_key = %key, object_key = %metadata.object_key, "Cached icon missing from blob store");
                self.forget(key).await;
                Ok(None)
            },
            Err(err) => Err(err.raise(ErrorKind::Storage)),
        }
    }

    async fn serve_resolved(&self, key: CacheKey, request: &IconRequest, now: UtcDateTime) -> Result<Served> {
        let result = self.resolver.load(&request.url, request.size, request.dpr).await;
        let Some(icon) = result.icon else {
            info!(candidates = result.found_icons.len(), "No icon found");
            return Ok(Served::NotFound);
        };
        let blob = Blob::new(icon.image.content, icon.image.content_type);
        let expiry = minimum_expiry(icon.image.expiry, now);
        self.store(key, blob.clone(), expiry, now);
        Ok(Served::Image { blob, expiry, effort: Effort::Resolved })
    }

    /// Remove a stale entry. Failing to do so only means the next request
    /// finds it stale again.
    async fn forget(&self, key: &CacheKey) {
        if let Err(err) = self.metadata.delete(key).await {
            warn!(cache_key = %key, error = ?err, "Failed to delete stale cache entry");
        }
    }

    fn touch(&self, key: CacheKey, now: UtcDateTime) {
        let metadata = Arc::clone(&self.metadata);
        self.tasks.spawn(
            async move {
                if let Err(err) = metadata.touch(&key, now).await {
                    warn!(cache_key = %key, error = ?err, "Failed to record cache access");
                }
            }
            .in_current_span(),
        );
    }

    fn store(&self, key: CacheKey, blob: Blob, expiry: UtcDateTime, now: UtcDateTime) {
        let storage = Arc::clone(&self.storage);
        let metadata = Arc::clone(&self.metadata);
        self.tasks.spawn(
            async move {
                let stored = match storage.put_if_absent(&blob).await {
                    Ok(stored) => stored,
                    Err(err) => {
                        warn!(cache_key = %key, backend = storage.name(), error = ?err, "Failed to store icon");
                        return;
                    },
                };
                let entry = CachedMetadata::new(stored.key, expiry, now);
                match metadata.set(&key, &entry).await {
                    Ok(()) => debug!(cache_key = %key, object_key = %entry.object_key, "Icon cached"),
                    Err(err) => warn!(cache_key = %key, error = ?err, "Failed to write cache metadata"),
                }
            }
            .in_current_span(),
        );
    }

    /// Wait for all background cache writes started so far.
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

fn public_location(public_url: &Url, object_key: &str) -> Result<Url> {
    let location = format!("{}/{object_key}", public_url.as_str().trim_end_matches('/'));
    Url::parse(&location).or_raise(|| ErrorKind::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use favr_cache::{Database, MetadataStore, Repository};
    use favr_fetch::{FetchOptions, Fetcher, MockClient, MockResponse};
    use favr_storage::StorageBackend;
    use favr_storage::backend::MockBackend;
    use time::Duration;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfavicon";

    struct Harness {
        service: IconService,
        client: MockClient,
        storage: Arc<MockBackend>,
        repo: Repository,
        db: Database,
    }

    fn url(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn request(site: &str) -> IconRequest {
        IconRequest::parse(Some(site), None, None).unwrap()
    }

    /// A site whose only icon is its `/favicon.ico`.
    fn favicon_site(client: MockClient, host: &str, body: &'static [u8]) -> MockClient {
        client
            .with_route(url(&format!("https://{host}/")), MockResponse::html("<html><head></head></html>"))
            .with_route(url(&format!("https://{host}/favicon.ico")), MockResponse::png(body))
    }

    async fn harness(client: MockClient) -> Harness {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let storage = Arc::new(MockBackend::default());
        let resolver = Resolver::new(Fetcher::new(Arc::new(client.clone()), FetchOptions::default()));
        let service = IconService::new(resolver, storage.clone(), Arc::new(repo.clone()));
        Harness { service, client, storage, repo, db }
    }

    fn image(served: Served) -> (Blob, Effort) {
        match served {
            Served::Image { blob, effort, .. } => (blob, effort),
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn test_ignore_cache_override() {
        assert!(ignore_cache_override(Some("true")));
        assert!(ignore_cache_override(Some(" TRUE ")));
        assert!(!ignore_cache_override(Some("1")));
        assert!(!ignore_cache_override(Some("false")));
        assert!(!ignore_cache_override(None));
    }

    #[tokio::test]
    async fn test_round_trip_serves_from_cache() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        let request = request("example.com");

        let (first, effort) = image(h.service.serve(&request).await.unwrap());
        assert_eq!(effort, Effort::Resolved);
        assert_eq!(first.content.as_ref(), PNG);
        h.service.flush().await;
        assert_eq!(h.storage.writes(), 1);

        let (second, effort) = image(h.service.serve(&request).await.unwrap());
        assert_eq!(effort, Effort::Cached);
        assert_eq!(second, first);
        assert_eq!(h.client.hits(&url("https://example.com/favicon.ico")), 1);
        assert_eq!(h.client.hits(&url("https://example.com/")), 1);
    }

    #[tokio::test]
    async fn test_metadata_written_with_freshness_floor() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        let before = UtcDateTime::now();
        h.service.serve(&request("example.com")).await.unwrap();
        h.service.flush().await;

        let entry = h.repo.get(&request("example.com").cache_key()).await.unwrap().unwrap();
        assert_eq!(entry.object_key, favr_storage::content_key(PNG));
        assert!(entry.expiry >= before + Duration::DAY - Duration::SECOND);
        assert!(entry.last_access >= before - Duration::SECOND);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let h = harness(MockClient::new()).await;
        let served = h.service.serve(&request("example.com")).await.unwrap();
        assert_eq!(served, Served::NotFound);
        h.service.flush().await;
        assert!(h.storage.is_empty().await);
        assert_eq!(h.repo.get(&request("example.com").cache_key()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_identical_icons_share_one_blob() {
        let client = favicon_site(MockClient::new(), "one.example", PNG);
        let h = harness(favicon_site(client, "two.example", PNG)).await;
        h.service.serve(&request("one.example")).await.unwrap();
        h.service.serve(&request("two.example")).await.unwrap();
        h.service.flush().await;

        assert_eq!(h.storage.len().await, 1);
        let one = h.repo.get(&request("one.example").cache_key()).await.unwrap().unwrap();
        let two = h.repo.get(&request("two.example").cache_key()).await.unwrap().unwrap();
        assert_eq!(one.object_key, two.object_key);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refreshed() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        let stale = Blob::new(&b"stale"[..], "image/png");
        let stored = h.storage.put_if_absent(&stale).await.unwrap();
        let key = request("example.com").cache_key();
        let now = UtcDateTime::now();
        h.repo.set(&key, &CachedMetadata::new(stored.key, now - Duration::HOUR, now - Duration::DAY)).await.unwrap();

        let (blob, effort) = image(h.service.serve(&request("example.com")).await.unwrap());
        assert_eq!(effort, Effort::Resolved);
        assert_eq!(blob.content.as_ref(), PNG);
        h.service.flush().await;
        let entry = h.repo.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.object_key, favr_storage::content_key(PNG));
        assert!(!entry.is_expired(UtcDateTime::now()));
    }

    #[tokio::test]
    async fn test_hit_records_access() {
        let h = harness(MockClient::new()).await;
        let stored = h.storage.put_if_absent(&Blob::new(PNG, "image/png")).await.unwrap();
        let key = request("example.com").cache_key();
        let long_ago = UtcDateTime::now() - Duration::DAY;
        h.repo.set(&key, &CachedMetadata::new(stored.key, long_ago + Duration::WEEK, long_ago)).await.unwrap();

        let (blob, effort) = image(h.service.serve(&request("example.com")).await.unwrap());
        assert_eq!(effort, Effort::Cached);
        assert_eq!(blob.content_type, "image/png");
        h.service.flush().await;
        assert!(h.repo.get(&key).await.unwrap().unwrap().last_access > long_ago);
        assert!(h.client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_hit_redirects_to_public_url() {
        let mut h = harness(MockClient::new()).await;
        h.service = h.service.with_public_url(Some(url("https://icons.example.net/favicons/")));
        let stored = h.storage.put_if_absent(&Blob::new(PNG, "image/png")).await.unwrap();
        let now = UtcDateTime::now();
        let key = request("example.com").cache_key();
        h.repo.set(&key, &CachedMetadata::new(stored.key.clone(), now + Duration::DAY, now)).await.unwrap();

        match h.service.serve(&request("example.com")).await.unwrap() {
            Served::Redirect { location, .. } => {
                assert_eq!(location.as_str(), format!("https://icons.example.net/favicons/{}", stored.key));
            },
            other => panic!("expected a redirect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_blob_falls_back_to_resolution() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        let key = request("example.com").cache_key();
        let now = UtcDateTime::now();
        let orphan = favr_storage::content_key(b"gone");
        h.repo.set(&key, &CachedMetadata::new(orphan, now + Duration::DAY, now)).await.unwrap();

        let (blob, effort) = image(h.service.serve(&request("example.com")).await.unwrap());
        assert_eq!(effort, Effort::Resolved);
        assert_eq!(blob.content.as_ref(), PNG);
    }

    #[tokio::test]
    async fn test_ignore_cache_resolves_again() {
        let mut h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        h.service = h.service.with_ignore_cache(true);
        h.service.serve(&request("example.com")).await.unwrap();
        h.service.flush().await;
        let (_, effort) = image(h.service.serve(&request("example.com")).await.unwrap());
        assert_eq!(effort, Effort::Resolved);
        assert_eq!(h.client.hits(&url("https://example.com/favicon.ico")), 2);
        // Writes still happen, so the cache is warm once the override is lifted.
        assert!(h.repo.get(&request("example.com").cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_degrades_to_uncached() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        h.storage.set_failing(true);
        let (blob, _) = image(h.service.serve(&request("example.com")).await.unwrap());
        assert_eq!(blob.content.as_ref(), PNG);
        h.service.flush().await;
        assert_eq!(h.repo.get(&request("example.com").cache_key()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_metadata_failure_is_internal() {
        let h = harness(favicon_site(MockClient::new(), "example.com", PNG)).await;
        h.db.close().await;
        let err = h.service.serve(&request("example.com")).await.unwrap_err();
        assert_eq!(err.code(), "internal");
        assert!(h.client.requests().is_empty());
    }

    #[test]
    fn test_public_location() {
        let key = favr_storage::content_key(b"x");
        let with_slash = public_location(&url("https://cdn.example.net/icons/"), &key).unwrap();
        let without = public_location(&url("https://cdn.example.net/icons"), &key).unwrap();
        assert_eq!(with_slash, without);
        assert_eq!(with_slash.path(), format!("/icons/{key}"));
    }
}
