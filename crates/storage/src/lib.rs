pub mod backend;
pub mod error;
mod key;

pub use crate::backend::{Blob, StorageBackend};
pub use crate::key::{KEY_LENGTH, content_key, validate as validate_key};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
