//! Outbound fetching for icon discovery.
//!
//! [`Fetcher`] is the only way this workspace talks to the network. Every
//! request goes through the URL policy first, every body is read through a
//! byte ceiling, and every fetch carries its own timeout. Failures here are
//! always per-candidate; deciding what a failure means is left to the caller.

mod client;
mod content_type;
pub mod error;
pub mod expiry;
mod fetcher;
mod image;
mod race;

#[cfg(any(test, feature = "mock"))]
pub use crate::client::{MockClient, MockResponse, RecordedRequest};
pub use crate::client::{BodyStream, HttpClient, HttpResponse, ReqwestClient};
pub use crate::content_type::{IMAGE_CONTENT_TYPES, charset, is_html_content_type, is_image_content_type, media_type};
pub use crate::fetcher::{
    BROWSER_USER_AGENT, ClientHandle, DEFAULT_TIMEOUT, DOCUMENT_BYTE_LIMIT, FetchOptions, FetchedPage, Fetcher,
    IMAGE_BYTE_LIMIT, MAX_REDIRECTS, TIMEOUT_ENV,
};
pub use crate::image::IconImage;
pub use crate::race::first_success;
pub use reqwest::header;
