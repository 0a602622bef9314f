//! Icon reference extraction.
//!
//! Two document types carry icon references: HTML pages (`<link rel="icon">`
//! and friends, plus a pointer to a web app manifest) and the manifest JSON
//! itself. Neither parser does any I/O; the HTML extractor is push-based so
//! the caller decides how bytes arrive and when to stop feeding.

mod consts;
mod decode;
pub mod error;
mod html;
mod manifest;
pub mod models;

pub use crate::html::{HtmlExtractor, PageMetadata, extract_metadata};
pub use crate::manifest::parse_manifest;
