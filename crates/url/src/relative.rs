use crate::consts::NON_RELATIVE_REGEX;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use url::Url;

/// `true` unless `href` is absolute (`https://...`) or scheme-relative (`//...`).
pub fn is_relative(href: &str) -> bool {
    !NON_RELATIVE_REGEX.is_match(href)
}

/// Resolve an icon reference into the URLs worth trying, in order.
///
/// Sites regularly write `href="favicon.png"` meaning `/favicon.png`. When a
/// reference has no leading slash and the base URL sits below the root, both
/// the directory-relative and the root-relative resolution are returned,
/// directory-relative first.
///
/// ```
/// use favr_url::{Url, resolve_relative};
/// let base = Url::parse("https://example.com/path/").unwrap();
/// let urls: Vec<_> = resolve_relative("image.png", &base).unwrap().iter().map(|u| u.to_string()).collect();
/// assert_eq!(urls, ["https://example.com/path/image.png", "https://example.com/image.png"]);
/// ```
pub fn resolve_relative(href: &str, base: &Url) -> Result<Vec<Url>> {
    let resolve = |reference: &str| base.join(reference).or_raise(|| ErrorKind::Unresolvable(href.to_string()));
    if !is_relative(href) {
        return Ok(vec![resolve(href)?]);
    }
    let segments = base.path().trim_start_matches('/').split('/').count();
    if !href.starts_with('/') && segments > 1 {
        return Ok(vec![resolve(href)?, resolve(&format!("/{href}"))?]);
    }
    Ok(vec![resolve(href)?])
}
