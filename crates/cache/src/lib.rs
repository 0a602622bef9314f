//! SQLite metadata store for cached favicons.
//!
//! The database maps a [`CacheKey`] (an opaque digest of host, size and pixel
//! ratio) to the blob holding the icon and the time it stops being fresh. It
//! is not the source of truth for anything: deleting it only costs a round of
//! re-resolution. Expired rows are left in place until the next read for
//! their key replaces or removes them.

mod db;
pub mod error;
mod key;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::key::CacheKey;
pub use crate::models::CachedMetadata;
pub use crate::repo::{MetadataHandle, MetadataStore, Repository};
