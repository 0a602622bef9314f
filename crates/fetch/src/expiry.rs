//! Freshness of fetched resources, derived from upstream caching headers.

use reqwest::header::{CACHE_CONTROL, EXPIRES, HeaderMap};
use time::format_description::well_known::Rfc2822;
use time::{Duration, OffsetDateTime, UtcDateTime};

/// Nothing is considered fresh for less than this, whatever upstream says.
pub const MINIMUM_FRESHNESS: Duration = Duration::DAY;

/// Expiry as advertised by the response headers.
///
/// `s-maxage` wins over `max-age`, and either wins over `Expires`.
pub fn upstream_expiry(headers: &HeaderMap, now: UtcDateTime) -> Option<UtcDateTime> {
    let directives: Vec<(String, &str)> = headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|directive| {
            let (name, value) = directive.split_once('=')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().trim_matches('"')))
        })
        .collect();
    let max_age = |wanted: &str| {
        directives.iter().find(|(name, _)| name == wanted).and_then(|(_, value)| value.parse::<i64>().ok())
    };
    if let Some(seconds) = max_age("s-maxage").or_else(|| max_age("max-age")) {
        return now.checked_add(Duration::seconds(seconds));
    }

    let expires = headers.get(EXPIRES)?.to_str().ok()?;
    let expires = OffsetDateTime::parse(expires.trim(), &Rfc2822).ok()?;
    UtcDateTime::from_unix_timestamp(expires.unix_timestamp()).ok()
}

/// Apply the freshness floor.
pub fn minimum_expiry(expiry: UtcDateTime, now: UtcDateTime) -> UtcDateTime {
    expiry.max(now + MINIMUM_FRESHNESS)
}

/// Expiry to record for a response received at `now`.
pub fn response_expiry(headers: &HeaderMap, now: UtcDateTime) -> UtcDateTime {
    minimum_expiry(upstream_expiry(headers, now).unwrap_or(now), now)
}
