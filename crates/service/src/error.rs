//! Service Error Types
//!
//! Every failure a caller can see is one of these kinds. Input problems map
//! onto a 4xx with a stable code; everything else is reported as a generic
//! internal error so no store or network detail leaks to the client.

use derive_more::{Display, Error};
use favr_resolve::SizeParam;
use serde::Serialize;

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("missing url")]
    MissingUrl,
    #[display("invalid url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Parses, but fails the outbound fetch policy.
    #[display("disallowed url: {_0}")]
    DisallowedUrl(#[error(not(source))] String),
    #[display("invalid size: {_0}")]
    InvalidSize(#[error(not(source))] String),
    #[display("invalid pixel ratio: {_0}")]
    InvalidDpr(#[error(not(source))] String),
    #[display("metadata store failure")]
    Metadata,
    #[display("blob store failure")]
    Storage,
    /// A configured value turned out to be unusable at request time.
    #[display("internal failure")]
    Internal,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Metadata | Self::Storage)
    }

    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::InvalidUrl(_) | Self::DisallowedUrl(_) => "invalid_url",
            Self::InvalidSize(_) => "invalid_size",
            Self::InvalidDpr(_) => "invalid_dpr",
            Self::Metadata | Self::Storage | Self::Internal => "internal",
        }
    }

    /// HTTP status the error should be reported with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Metadata | Self::Storage | Self::Internal => 500,
            _ => 400,
        }
    }
}

/// JSON error body: `{"code": "...", "message": "..."}`.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[display("{code}: {message}")]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip)]
    status: u16,
}

impl ApiError {
    pub fn internal() -> Self {
        Self { code: "internal", message: "Internal error".to_string(), status: 500 }
    }

    pub fn status(&self) -> u16 {
        self.status
    }
}

impl From<&ErrorKind> for ApiError {
    fn from(kind: &ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::MissingUrl => "Missing 'url' query parameter".to_string(),
            ErrorKind::InvalidUrl(_) | ErrorKind::DisallowedUrl(_) => "Invalid 'url' query parameter".to_string(),
            ErrorKind::InvalidSize(_) => {
                let sizes = SizeParam::ALL.map(|size| size.as_str()).join(", ");
                format!("Invalid 'size' query parameter. Valid sizes are {sizes}")
            },
            ErrorKind::InvalidDpr(_) => "Invalid 'dpr' query parameter. This should be a number".to_string(),
            ErrorKind::Metadata | ErrorKind::Storage | ErrorKind::Internal => return Self::internal(),
        };
        Self { code: kind.code(), message, status: kind.status() }
    }
}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        Self::from(&**err)
    }
}
