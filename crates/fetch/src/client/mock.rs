use super::{BodyStream, HttpClient, HttpResponse};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Bodies are handed out in chunks of this size so consumers see a stream.
const CHUNK_SIZE: usize = 1024;

/// Canned response for [`MockClient`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    delay: Option<Duration>,
    final_url: Option<Url>,
    stalled: bool,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new(), delay: None, final_url: None, stalled: false }
    }

    /// `200 OK` with the given content type and body.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self::new(200).with_header(CONTENT_TYPE, HeaderValue::from_static(content_type)).with_body(body)
    }

    pub fn png(body: impl Into<Bytes>) -> Self {
        Self::ok("image/png", body)
    }

    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::ok("text/html; charset=utf-8", body)
    }

    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::ok("application/manifest+json", body)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cache_control(self, value: &'static str) -> Self {
        self.with_header(CACHE_CONTROL, HeaderValue::from_static(value))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Wait this long before the response head is returned.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never end the body after its last chunk, like a server that keeps the
    /// connection open while it renders the rest of the page.
    pub fn with_stalled_body(mut self) -> Self {
        self.stalled = true;
        self
    }

    /// Pretend the request was redirected and ended up at `url`.
    pub fn with_final_url(mut self, url: Url) -> Self {
        self.final_url = Some(url);
        self
    }
}

/// A request the mock received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: Url,
    pub user_agent: Option<String>,
}

/// In-memory [`HttpClient`] serving canned responses by exact URL.
///
/// Unknown URLs get an empty `404`. Clones share routes and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    routes: Arc<Mutex<HashMap<Url, MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, url: Url, response: MockResponse) -> Self {
        self.insert(url, response);
        self
    }

    pub fn insert(&self, url: Url, response: MockResponse) {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).insert(url, response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests received for `url`.
    pub fn hits(&self, url: &Url) -> usize {
        self.requests().iter().filter(|request| &request.url == url).count()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get(&self, url: &Url, user_agent: Option<&str>) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest { url: url.clone(), user_agent: user_agent.map(str::to_string) });
        let route = self.routes.lock().unwrap_or_else(PoisonError::into_inner).get(url).cloned();
        let response = route.unwrap_or_else(|| MockResponse::new(404));

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        let chunks: Vec<_> = (0..response.body.len())
            .step_by(CHUNK_SIZE)
            .map(|start| {
                let end = (start + CHUNK_SIZE).min(response.body.len());
                Ok::<_, std::io::Error>(response.body.slice(start..end))
            })
            .collect();
        let body = futures::stream::iter(chunks);
        let body: BodyStream = match response.stalled {
            true => Box::pin(body.chain(futures::stream::pending())),
            false => Box::pin(body),
        };
        Ok(HttpResponse {
            url: response.final_url.unwrap_or_else(|| url.clone()),
            status: response.status,
            headers: response.headers,
            body,
        })
    }
}
