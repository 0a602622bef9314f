//! Resolution Error Types

use derive_more::{Display, Error};

/// A resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Only the parameter errors ever reach a caller of the resolver; the rest
/// explain why a discovery strategy came back empty-handed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid size {_0:?}")]
    InvalidSize(#[error(not(source))] String),
    #[display("invalid pixel ratio {_0:?}")]
    InvalidPixelRatio(#[error(not(source))] String),
    #[display("page could not be fetched")]
    Page,
    #[display("page references no icons")]
    NoIcon,
    #[display("icon reference could not be resolved")]
    Unresolvable,
    #[display("inline icon data is malformed")]
    InvalidInlineData,
    #[display("no icon candidate could be fetched")]
    NoValidImage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Page | Self::NoValidImage)
    }
}
