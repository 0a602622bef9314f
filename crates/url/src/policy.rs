use url::{Host, Url};

/// Whether a URL may be dereferenced by the fetcher.
///
/// Only plain `https` to a named host on the default port is allowed. IP
/// literals (v4 or v6, in any of the notations the URL parser understands)
/// and `localhost` are rejected outright.
pub fn is_allowed(url: &Url) -> bool {
    if url.scheme() != "https" {
        return false;
    }
    // An explicit `:443` is normalised away by the parser.
    if !matches!(url.port(), None | Some(443)) {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => !domain.trim_end_matches('.').eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(_) | Host::Ipv6(_)) | None => false,
    }
}
