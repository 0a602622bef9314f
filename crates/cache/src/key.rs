use derive_more::Display;
use std::fmt::Display as FmtDisplay;

/// Opaque digest addressing one cached resolution.
///
/// Derived from the site host, the requested size and the pixel ratio. The
/// host only ever enters the key through the digest, so neither the database
/// nor its logs carry the sites that were looked up in readable form.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(host: &str, size: impl FmtDisplay, pixel_ratio: impl FmtDisplay) -> Self {
        let material = format!("{}|{size}|{pixel_ratio}", host.to_ascii_lowercase());
        Self(blake3::hash(material.as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
