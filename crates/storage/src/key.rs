//! Object key derivation and validation.
//!
//! Blobs are addressed by the BLAKE3 digest of their bytes, hex encoded. Keys
//! arriving from elsewhere (metadata rows, configuration) are validated before
//! any backend turns them into a filesystem path or an object name.

use crate::error::{ErrorKind, Result};

/// Length of a hex encoded BLAKE3 digest.
pub const KEY_LENGTH: usize = blake3::OUT_LEN * 2;

/// Derive the content-addressed key of `data`.
pub fn content_key(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Check that `key` is a lowercase hex digest of the expected length.
///
/// Anything else is rejected so that no key can ever escape a backend's root
/// or collide with the sidecar files the local backend keeps next to blobs.
pub fn validate(key: &str) -> Result<&str> {
    if key.len() != KEY_LENGTH || !key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}
