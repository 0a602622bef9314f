//! Async Utility Error Types

use derive_more::{Display, Error};

/// A stream error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for stream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// More bytes arrived than the configured ceiling allows.
    #[display("maximum size limit of {limit} bytes exceeded")]
    LimitExceeded { limit: usize },
    /// The wrapped stream itself failed.
    #[display("underlying stream failed")]
    Stream,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stream)
    }
}
