use std::fmt;
use url::Url;

const MAX_VISIBLE_SEGMENT: usize = 6;

/// Redact a URL for logging.
///
/// Keeps scheme, host and port. Any path segment longer than six characters
/// becomes `***`. Query and fragment are dropped entirely.
///
/// ```
/// use favr_url::{Url, obfuscate};
/// let url = Url::parse("https://google.com/a/something-sensitive?token=1").unwrap();
/// assert_eq!(obfuscate(&url), "https://google.com/a/***");
/// ```
pub fn obfuscate(url: &Url) -> String {
    Redacted(url).to_string()
}

/// [`Display`](fmt::Display) adapter for [`obfuscate`], so tracing fields can
/// use `url = %Redacted(&url)` without allocating up front.
pub struct Redacted<'a>(pub &'a Url);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self.0;
        write!(f, "{}://", url.scheme())?;
        if let Some(host) = url.host_str() {
            f.write_str(host)?;
        }
        if let Some(port) = url.port() {
            write!(f, ":{port}")?;
        }
        for (index, segment) in url.path().split('/').enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            match segment.chars().count() > MAX_VISIBLE_SEGMENT {
                true => f.write_str("***")?,
                false => f.write_str(segment)?,
            }
        }
        Ok(())
    }
}
