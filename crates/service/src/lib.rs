//! Cache-aside icon serving.
//!
//! [`IconService`] wraps the [`Resolver`](favr_resolve::Resolver) with the
//! metadata store and the blob store: requests are validated into an
//! [`IconRequest`], served from the cache when a fresh entry exists, and
//! otherwise resolved and cached in the background. [`Served`] carries
//! everything needed to build the HTTP response, and
//! [`ApiError`](error::ApiError) is the JSON body for failures.

pub mod error;
mod request;
mod response;
mod service;

pub use crate::request::IconRequest;
pub use crate::response::{Effort, Served, cache_control, max_age};
pub use crate::service::{IGNORE_CACHE_ENV, IconService};
