use bytes::Bytes;
use time::UtcDateTime;
use url::Url;

/// Image bytes fetched for an icon candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IconImage {
    /// Where the bytes came from.
    pub source: Url,
    #[cfg_attr(feature = "serde", serde(rename = "bytes", serialize_with = "serialize_len"))]
    pub content: Bytes,
    /// Bare media type, e.g. `image/png`.
    pub content_type: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_timestamp"))]
    pub expiry: UtcDateTime,
}

impl IconImage {
    /// The same image with a different expiry.
    pub fn with_expiry(self, expiry: UtcDateTime) -> Self {
        Self { expiry, ..self }
    }
}

#[cfg(feature = "serde")]
fn serialize_len<S: serde::Serializer>(content: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(content.len() as u64)
}

#[cfg(feature = "serde")]
fn serialize_timestamp<S: serde::Serializer>(expiry: &UtcDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(expiry.unix_timestamp())
}
