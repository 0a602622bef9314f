//! Fetch Error Types

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single fetch did not produce a usable resource.
///
/// Every one of these is a per-candidate failure: callers racing several
/// candidates treat them identically and move on to the next.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL (or a redirect target) is outside the outbound fetch policy.
    #[display("URL is not allowed to be fetched")]
    Disallowed,
    #[display("request timed out")]
    Timeout,
    #[display("connection failed")]
    Connection,
    /// Too many redirects, or a redirect the policy refused to follow.
    #[display("redirect refused")]
    Redirect,
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    #[display("unexpected content type: {}", _0.as_deref().unwrap_or("<none>"))]
    ContentType(#[error(not(source))] Option<String>),
    #[display("response body exceeds the byte limit")]
    TooLarge,
    #[display("failed to read response body")]
    Body,
    /// The body arrived intact but isn't a document we understand.
    #[display("invalid document")]
    InvalidDocument,
    /// Every candidate in a race failed.
    #[display("no valid image found")]
    NoValidImage,
    #[display("failed to initialize HTTP client")]
    Client,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection | Self::Body => true,
            Self::Status(status) => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Timeout, true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(429), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::ContentType(Some("text/html".into())), false)]
    #[case(ErrorKind::TooLarge, false)]
    #[case(ErrorKind::Disallowed, false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn test_content_type_display() {
        assert_eq!(ErrorKind::ContentType(None).to_string(), "unexpected content type: <none>");
        assert_eq!(
            ErrorKind::ContentType(Some("text/plain".into())).to_string(),
            "unexpected content type: text/plain"
        );
    }
}
