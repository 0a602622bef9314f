//! Turning a served icon into HTTP response parts.

use favr_fetch::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION,
};
use favr_storage::Blob;
use favr_storage::backend::DEFAULT_CONTENT_TYPE;
use time::{Duration, UtcDateTime};
use url::Url;

/// Where the bytes of a served icon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effort {
    /// Read back from the blob store; no outbound request was made.
    Cached,
    /// Freshly resolved from the site.
    Resolved,
}

/// The outcome of serving an icon request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Raw image bytes.
    Image { blob: Blob, expiry: UtcDateTime, effort: Effort },
    /// The icon is cached and publicly reachable at `location`.
    Redirect { location: Url, expiry: UtcDateTime },
    /// Neither strategy found an icon.
    NotFound,
}

impl Served {
    pub fn status(&self) -> u16 {
        match self {
            Self::Image { .. } => 200,
            Self::Redirect { .. } => 302,
            Self::NotFound => 404,
        }
    }

    pub fn expiry(&self) -> Option<UtcDateTime> {
        match self {
            Self::Image { expiry, .. } | Self::Redirect { expiry, .. } => Some(*expiry),
            Self::NotFound => None,
        }
    }

    /// Response headers, with `Cache-Control` computed against `now`.
    pub fn headers(&self, now: UtcDateTime) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            Self::Image { blob, .. } => {
                let content_type = HeaderValue::from_str(&blob.content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
                headers.insert(CONTENT_TYPE, content_type);
                headers.insert(CONTENT_LENGTH, HeaderValue::from(blob.content.len()));
                headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
            },
            Self::Redirect { location, .. } => {
                if let Ok(location) = HeaderValue::from_str(location.as_str()) {
                    headers.insert(LOCATION, location);
                }
            },
            Self::NotFound => {},
        }
        if let Some(expiry) = self.expiry()
            && let Ok(value) = HeaderValue::from_str(&cache_control(expiry, now))
        {
            headers.insert(CACHE_CONTROL, value);
        }
        headers
    }
}

/// Whole seconds until `expiry`, rounded up and never negative.
pub fn max_age(expiry: UtcDateTime, now: UtcDateTime) -> u64 {
    let delta = expiry - now;
    if delta <= Duration::ZERO {
        return 0;
    }
    let seconds = delta.whole_seconds().unsigned_abs();
    match delta.subsec_nanoseconds() {
        0 => seconds,
        _ => seconds + 1,
    }
}

/// `Cache-Control` value for a response that stays fresh until `expiry`.
pub fn cache_control(expiry: UtcDateTime, now: UtcDateTime) -> String {
    format!("public, max-age={}", max_age(expiry, now))
}
