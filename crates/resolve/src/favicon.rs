use crate::models::{Icon, LoadResult};
use favr_extract::models::IconSource;
use favr_fetch::Fetcher;
use favr_url::{Redacted, candidate_base_hosts, favicon_url};
use tracing::instrument;
use url::Url;

/// How far up the subdomain tree to look for `/favicon.ico`.
pub const MAX_BASE_HOSTS: usize = 3;

/// Try `/favicon.ico` on the site's host and its parent domains, preferring
/// the deepest subdomain that serves a valid image.
///
/// Never fails: if nothing is found the result simply has no icon. Every
/// candidate is listed in `found_icons` either way.
#[instrument(skip(fetcher), fields(url = %Redacted(url)))]
pub async fn load_favicon_ico(fetcher: &Fetcher, url: &Url) -> LoadResult {
    let candidates: Vec<Url> = candidate_base_hosts(url, MAX_BASE_HOSTS).iter().map(favicon_url).collect();
    let found_icons = candidates.iter().map(|url| IconSource::Favicon { url: url.clone() }).collect();

    match fetcher.first_valid_image(&candidates).await {
        Ok((url, image)) => {
            tracing::debug!(url = %Redacted(&url), "Found /favicon.ico");
            LoadResult { icon: Some(Icon { image, source: IconSource::Favicon { url } }), found_icons }
        },
        Err(err) => {
            tracing::info!(error = ?err, "No /favicon.ico found");
            LoadResult { icon: None, found_icons }
        },
    }
}
