use crate::models::LoadResult;
use url::Url;

/// A discovery strategy whose icon can be preferred over the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FaviconIco,
    Page,
}

/// Overrides the default preference for one host.
#[derive(Debug, Clone, Copy)]
pub struct MergeRule {
    /// Compared case-insensitively against the requested URL's host.
    pub host: &'static str,
    pub preference: [Strategy; 2],
}

/// The page usually carries richer, sized icons.
pub const DEFAULT_PREFERENCE: [Strategy; 2] = [Strategy::Page, Strategy::FaviconIco];

pub const RULES: &[MergeRule] = &[
    // Their `/favicon.ico` looks better than anything the page declares.
    MergeRule { host: "developer.apple.com", preference: [Strategy::FaviconIco, Strategy::Page] },
];

/// Strategy preference for the requested URL.
pub fn preference(url: &Url, rules: &[MergeRule]) -> [Strategy; 2] {
    let host = url.host_str().unwrap_or_default();
    rules
        .iter()
        .find(|rule| rule.host.eq_ignore_ascii_case(host))
        .map_or(DEFAULT_PREFERENCE, |rule| rule.preference)
}

/// Combine both strategies' results: the icon comes from the first
/// preferred strategy that found one, and `found_icons` is always the
/// favicon trail followed by the page trail.
pub fn merge(url: &Url, favicon: LoadResult, page: LoadResult) -> LoadResult {
    merge_with_rules(url, favicon, page, RULES)
}

pub fn merge_with_rules(url: &Url, favicon: LoadResult, page: LoadResult, rules: &[MergeRule]) -> LoadResult {
    let LoadResult { icon: mut favicon_icon, mut found_icons } = favicon;
    let LoadResult { icon: mut page_icon, found_icons: page_found } = page;
    found_icons.extend(page_found);

    let icon = preference(url, rules).into_iter().find_map(|strategy| match strategy {
        Strategy::FaviconIco => favicon_icon.take(),
        Strategy::Page => page_icon.take(),
    });
    LoadResult { icon, found_icons }
}
