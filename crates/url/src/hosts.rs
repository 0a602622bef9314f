use url::Url;

/// Origin-only copy of `url` (scheme, host and port; root path).
fn origin(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}

/// Candidate base URLs for a host, most specific first.
///
/// Repeatedly strips the leftmost label of the host, stopping before the
/// public suffix: `a.b.example.co.uk` yields `a.b.example.co.uk`,
/// `b.example.co.uk` and `example.co.uk`, never `co.uk`. The result is capped
/// to `max_levels` entries (at least one).
///
/// Hosts without a recognised public suffix (IP literals, `localhost`,
/// made-up TLDs) and hosts that *are* a public suffix yield only their own
/// origin.
///
/// ```
/// use favr_url::{Url, candidate_base_hosts};
/// let url = Url::parse("https://docs.google.com/document/d/1").unwrap();
/// let hosts: Vec<_> = candidate_base_hosts(&url, 3).iter().map(|u| u.to_string()).collect();
/// assert_eq!(hosts, ["https://docs.google.com/", "https://google.com/"]);
/// ```
pub fn candidate_base_hosts(url: &Url, max_levels: usize) -> Vec<Url> {
    let max_levels = max_levels.max(1);
    let Some(host) = url.domain() else {
        return vec![origin(url)];
    };
    let host = host.trim_end_matches('.');
    let suffix_len = match psl::suffix(host.as_bytes()) {
        Some(suffix) if suffix.is_known() => suffix.as_bytes().len(),
        _ => return vec![origin(url)],
    };
    let (labels, suffix) = host.split_at(host.len() - suffix_len);
    let labels: Vec<&str> = labels.split('.').filter(|label| !label.is_empty()).collect();
    if labels.is_empty() {
        return vec![origin(url)];
    }

    let candidates: Vec<Url> = (0..labels.len())
        .filter_map(|start| {
            let candidate = format!("{}://{}.{}", url.scheme(), labels[start..].join("."), suffix);
            Url::parse(&candidate).ok()
        })
        .take(max_levels)
        .collect();
    match candidates.is_empty() {
        true => vec![origin(url)],
        false => candidates,
    }
}
