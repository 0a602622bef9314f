use crate::client::{HttpClient, HttpResponse};
use crate::content_type::{charset, is_html_content_type, is_image_content_type, media_type};
use crate::error::{ErrorKind, Result};
use crate::expiry::response_expiry;
use crate::image::IconImage;
use bytes::{Bytes, BytesMut};
use exn::ResultExt;
use favr_asyncutils::BoundedStreamExt;
use favr_asyncutils::error::ErrorKind as StreamErrorKind;
use favr_extract::models::ManifestIcon;
use favr_extract::{HtmlExtractor, PageMetadata, parse_manifest};
use favr_url::{Redacted, is_allowed};
use futures::{Stream, StreamExt};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;
use url::Url;

/// Read on every fetch; milliseconds.
pub const TIMEOUT_ENV: &str = "FAVR_FETCH_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const IMAGE_BYTE_LIMIT: usize = 1024 * 1024;
pub const DOCUMENT_BYTE_LIMIT: usize = 2 * 1024 * 1024;
pub const MAX_REDIRECTS: usize = 10;
/// Some sites serve different markup (or nothing at all) to clients that
/// don't look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like \
                                      Gecko) Version/17.1 Safari/605.1.15";

/// Chunks buffered between the network and the HTML tokenizer.
const PARSE_QUEUE_DEPTH: usize = 4;

pub type ClientHandle = Arc<dyn HttpClient + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Applies to each fetch as a whole, body included.
    pub timeout: Duration,
    pub image_limit: usize,
    /// Applies to HTML pages and manifests.
    pub document_limit: usize,
    /// Sent with page and manifest requests.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            image_limit: IMAGE_BYTE_LIMIT,
            document_limit: DOCUMENT_BYTE_LIMIT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// An HTML page, reduced to the icon references in its head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects; relative references resolve against this.
    pub url: Url,
    /// Already floored to the minimum freshness.
    pub expiry: UtcDateTime,
    pub metadata: PageMetadata,
}

/// Fetches images, pages and manifests under the outbound policy: only
/// allowed URLs, bounded bodies, and a timeout per fetch.
#[derive(Clone)]
pub struct Fetcher {
    client: ClientHandle,
    options: Arc<FetchOptions>,
}

impl Fetcher {
    pub fn new(client: ClientHandle, options: FetchOptions) -> Self {
        Self { client, options: Arc::new(options) }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// The configured timeout, unless overridden through the environment.
    pub fn timeout(&self) -> Duration {
        timeout_override(std::env::var(TIMEOUT_ENV).ok().as_deref()).unwrap_or(self.options.timeout)
    }

    /// Fetch an image: 2xx status, an image content type, and a body within
    /// the image limit.
    #[instrument(skip(self), fields(url = %Redacted(url)))]
    pub async fn image(&self, url: &Url) -> Result<IconImage> {
        tokio::time::timeout(self.timeout(), self.fetch_image(url)).await.or_raise(|| ErrorKind::Timeout)?
    }

    /// Fetch an HTML page and extract its icon references, reading only as
    /// far as the end of `<head>`. Any status is accepted.
    #[instrument(skip(self), fields(url = %Redacted(url)))]
    pub async fn page(&self, url: &Url) -> Result<FetchedPage> {
        tokio::time::timeout(self.timeout(), self.fetch_page(url)).await.or_raise(|| ErrorKind::Timeout)?
    }

    /// Fetch and parse a web app manifest. Relative icon references resolve
    /// against the manifest's final URL.
    #[instrument(skip(self), fields(url = %Redacted(url)))]
    pub async fn manifest(&self, url: &Url) -> Result<Vec<ManifestIcon>> {
        tokio::time::timeout(self.timeout(), self.fetch_manifest(url)).await.or_raise(|| ErrorKind::Timeout)?
    }

    async fn send(&self, url: &Url, user_agent: Option<&str>) -> Result<HttpResponse> {
        if !is_allowed(url) {
            exn::bail!(ErrorKind::Disallowed);
        }
        self.client.get(url, user_agent).await
    }

    async fn fetch_image(&self, url: &Url) -> Result<IconImage> {
        let response = self.send(url, None).await?;
        if !response.is_success() {
            exn::bail!(ErrorKind::Status(response.status));
        }
        let content_type = match response.content_type() {
            Some(content_type) if is_image_content_type(content_type) => media_type(content_type),
            other => exn::bail!(ErrorKind::ContentType(other.map(str::to_string))),
        };
        let expiry = response_expiry(&response.headers, UtcDateTime::now());
        let content = read_to_end(response.body, self.options.image_limit).await?;

        tracing::debug!(bytes = content.len(), content_type = %content_type, "Fetched image");
        Ok(IconImage { source: url.clone(), content, content_type, expiry })
    }

    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        let response = self.send(url, Some(&self.options.user_agent)).await?;
        let charset = match response.content_type() {
            Some(content_type) if is_html_content_type(content_type) => charset(content_type).map(str::to_string),
            other => exn::bail!(ErrorKind::ContentType(other.map(str::to_string))),
        };
        let expiry = response_expiry(&response.headers, UtcDateTime::now());
        let HttpResponse { url: base, status, body, .. } = response;
        let metadata = extract_streaming(body, base.clone(), charset, self.options.document_limit).await?;

        tracing::debug!(
            status,
            links = metadata.link_icons.len(),
            manifest = metadata.manifest_url.is_some(),
            "Extracted page metadata"
        );
        Ok(FetchedPage { url: base, expiry, metadata })
    }

    async fn fetch_manifest(&self, url: &Url) -> Result<Vec<ManifestIcon>> {
        let response = self.send(url, Some(&self.options.user_agent)).await?;
        if !response.is_success() {
            exn::bail!(ErrorKind::Status(response.status));
        }
        let base = response.url.clone();
        let body = read_to_end(response.body, self.options.document_limit).await?;
        parse_manifest(&body, &base).or_raise(|| ErrorKind::InvalidDocument)
    }
}

fn timeout_override(raw: Option<&str>) -> Option<Duration> {
    raw?.trim().parse::<u64>().ok().map(Duration::from_millis)
}

#[track_caller]
fn body_error(err: favr_asyncutils::error::Error) -> crate::error::Error {
    let kind = match &*err {
        StreamErrorKind::LimitExceeded { .. } => ErrorKind::TooLarge,
        StreamErrorKind::Stream => ErrorKind::Body,
    };
    err.raise(kind)
}

async fn read_to_end<S>(body: S, limit: usize) -> Result<Bytes>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let mut body = body.bounded(limit);
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk.map_err(body_error)?);
    }
    Ok(buffer.freeze())
}

/// Feed a page body to the HTML extractor as it arrives, stopping once the
/// extractor has seen enough.
///
/// The tokenizer's buffers are not `Send`, so it lives on a blocking worker
/// and chunks reach it over a channel. When the worker finishes early it
/// drops the receiver: reading stops right there, even if the server keeps
/// the connection open. A body that fails after the head was complete (too
/// large, connection reset) still yields the links already found.
async fn extract_streaming<S>(body: S, base: Url, charset: Option<String>, limit: usize) -> Result<PageMetadata>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let (sender, mut receiver) = tokio::sync::mpsc::channel::<Bytes>(PARSE_QUEUE_DEPTH);
    let worker = tokio::task::spawn_blocking(move || {
        let mut extractor = HtmlExtractor::with_charset(base, charset.as_deref());
        while let Some(chunk) = receiver.blocking_recv() {
            if extractor.feed(&chunk) {
                break;
            }
        }
        drop(receiver);
        (extractor.is_done(), extractor.finish())
    });

    let mut body = body.bounded(limit);
    let mut failure = None;
    loop {
        let chunk = tokio::select! {
            biased;
            () = sender.closed() => break,
            chunk = body.next() => chunk,
        };
        match chunk {
            Some(Ok(chunk)) => {
                if sender.send(chunk).await.is_err() {
                    break;
                }
            },
            Some(Err(err)) => {
                failure = Some(err);
                break;
            },
            None => break,
        }
    }
    drop(body);
    drop(sender);
    let (done, metadata) = worker.await.or_raise(|| ErrorKind::InvalidDocument)?;
    match failure {
        Some(err) if !done => Err(body_error(err)),
        _ => Ok(metadata),
    }
}
