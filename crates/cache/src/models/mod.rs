mod metadata;

pub use self::metadata::CachedMetadata;
pub(crate) use self::metadata::MetadataRow;
