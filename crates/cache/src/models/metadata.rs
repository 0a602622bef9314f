use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::{Duration, UtcDateTime};

/// What the cache remembers about one resolution: where the icon bytes live
/// and how long they may be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMetadata {
    /// Content-addressed key of the icon in the blob store.
    pub object_key: String,
    pub expiry: UtcDateTime,
    pub last_access: UtcDateTime,
}
impl CachedMetadata {
    pub fn new(object_key: impl Into<String>, expiry: UtcDateTime, now: UtcDateTime) -> Self {
        Self { object_key: object_key.into(), expiry, last_access: now }
    }

    /// Expired entries are not served; an entry expiring exactly `now` is expired.
    pub fn is_expired(&self, now: UtcDateTime) -> bool {
        self.expiry <= now
    }

    /// Time left before expiry, never negative.
    pub fn remaining(&self, now: UtcDateTime) -> Duration {
        (self.expiry - now).max(Duration::ZERO)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MetadataRow {
    pub(crate) object_key: String,
    pub(crate) expiry: i64,
    pub(crate) last_access: i64,
}
impl TryFrom<MetadataRow> for CachedMetadata {
    type Error = Error;
    fn try_from(row: MetadataRow) -> Result<Self, Self::Error> {
        if row.object_key.is_empty() || !row.object_key.bytes().all(|b| b.is_ascii_alphanumeric()) {
            exn::bail!(ErrorKind::InvalidData("object key"));
        }
        Ok(Self {
            object_key: row.object_key,
            expiry: UtcDateTime::from_unix_timestamp(row.expiry).or_raise(|| ErrorKind::InvalidData("expiry"))?,
            last_access: UtcDateTime::from_unix_timestamp(row.last_access)
                .or_raise(|| ErrorKind::InvalidData("last access"))?,
        })
    }
}
