//! URL Error Types

use derive_more::{Display, Error};

/// A URL error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for URL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input could not be parsed as a URL, even after normalisation.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// A relative reference could not be resolved against its base.
    #[display("unresolvable reference: {_0}")]
    Unresolvable(#[error(not(source))] String),
    /// Not a `data:<type>;base64,<payload>` URL.
    #[display("malformed data URL")]
    MalformedDataUrl,
    /// The payload of a data URL is not valid base64.
    #[display("invalid base64 payload in data URL")]
    InvalidPayload,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing is deterministic.
        false
    }
}
