use crate::consts::SCHEME_REGEX;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::borrow::Cow;
use url::Url;

/// Turn loose user input into an absolute `https` URL.
///
/// Input without a scheme is assumed to be a bare host (or host and path) and
/// is given `https://`. Plain `http` is upgraded to `https`. Any other scheme
/// is kept as-is and left for [`is_allowed`](crate::is_allowed) to reject.
///
/// ```
/// use favr_url::normalize;
/// assert_eq!(normalize("google.com").unwrap().as_str(), "https://google.com/");
/// assert_eq!(normalize("http://google.com").unwrap().as_str(), "https://google.com/");
/// assert!(normalize("").is_err());
/// ```
pub fn normalize(input: impl AsRef<str>) -> Result<Url> {
    let input = input.as_ref().trim();
    let with_scheme = match SCHEME_REGEX.is_match(input) {
        true => Cow::Borrowed(input),
        false => Cow::Owned(format!("https://{input}")),
    };
    let mut url = Url::parse(&with_scheme).or_raise(|| ErrorKind::InvalidUrl(input.to_string()))?;
    if url.scheme() == "http" && url.set_scheme("https").is_err() {
        exn::bail!(ErrorKind::InvalidUrl(input.to_string()));
    }
    Ok(url)
}

/// The conventional `/favicon.ico` location on the same origin as `base`.
pub fn favicon_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path("/favicon.ico");
    url.set_query(None);
    url.set_fragment(None);
    url
}
