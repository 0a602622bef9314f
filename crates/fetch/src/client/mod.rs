//! The HTTP transport seam.
//!
//! Everything above this module talks to an [`HttpClient`] trait object, so
//! tests swap in [`MockClient`] and never touch the network.

#[cfg(any(test, feature = "mock"))]
mod mock;
mod http;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io;
use std::pin::Pin;
use url::Url;

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockClient, MockResponse, RecordedRequest};
pub use self::http::ReqwestClient;

pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Response head plus a body that has not been read yet.
pub struct HttpResponse {
    /// Final URL, after any redirects were followed.
    pub url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw `Content-Type` header, if present and printable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
    }
}

impl Debug for HttpResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HttpResponse")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// TODO: When `dyn async trait` stabilizes, migrate to native 2024 Edition async traits.
#[async_trait]
pub trait HttpClient {
    /// Issue a `GET`. Redirects are followed by the client itself; the
    /// caller is responsible for checking the initial URL against policy.
    async fn get(&self, url: &Url, user_agent: Option<&str>) -> Result<HttpResponse>;
}
