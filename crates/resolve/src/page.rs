use crate::error::{ErrorKind, Result};
use crate::models::{Icon, LoadResult};
use crate::params::{PixelRatio, SizeParam};
use crate::rank::rank_by_size;
use bytes::Bytes;
use exn::{OptionExt, ResultExt};
use favr_extract::models::{IconSource, ManifestIcon};
use favr_fetch::{FetchedPage, Fetcher, IconImage};
use favr_url::{DataUrl, Redacted, is_relative, resolve_relative};
use tracing::instrument;
use url::Url;

/// Discover icons through the site's HTML page (and its web app manifest,
/// when it links one), then fetch the best fit for `size` and `dpr`.
///
/// Never fails: any problem along the way yields an empty result.
#[instrument(skip(fetcher), fields(url = %Redacted(url)))]
pub async fn load_from_page(fetcher: &Fetcher, url: &Url, size: SizeParam, dpr: PixelRatio) -> LoadResult {
    match try_load_from_page(fetcher, url, size, dpr).await {
        Ok(result) => result,
        Err(err) => {
            tracing::info!(error = ?err, "No icon found through page");
            LoadResult::empty()
        },
    }
}

async fn try_load_from_page(fetcher: &Fetcher, url: &Url, size: SizeParam, dpr: PixelRatio) -> Result<LoadResult> {
    let page = fetcher.page(url).await.or_raise(|| ErrorKind::Page)?;
    let manifest_icons = match &page.metadata.manifest_url {
        Some(manifest_url) => manifest_icons(fetcher, manifest_url).await,
        None => Vec::new(),
    };

    let found_icons: Vec<IconSource> = page
        .metadata
        .link_icons
        .iter()
        .cloned()
        .map(IconSource::Link)
        .chain(manifest_icons.into_iter().map(IconSource::Manifest))
        .collect();
    let best = rank_by_size(&found_icons, size, dpr).cloned().ok_or_raise(|| ErrorKind::NoIcon)?;

    if best.is_inline() {
        let image = inline_image(&best, &page)?;
        return Ok(LoadResult { icon: Some(Icon { image, source: best }), found_icons });
    }

    let candidates = candidate_urls(&best, &page.url)?;
    let (fetched_from, image) =
        fetcher.first_valid_image(&candidates).await.or_raise(|| ErrorKind::NoValidImage)?;
    // The page decides how long its choice of icon stays valid.
    let image = image.with_expiry(page.expiry);

    // Record where the icon actually came from, keeping audit trail order.
    let found_icons = found_icons
        .into_iter()
        .map(|source| match source.is_same_reference(&best) {
            true => source.with_url(fetched_from.clone()),
            false => source,
        })
        .collect();
    let source = best.with_url(fetched_from);
    Ok(LoadResult { icon: Some(Icon { image, source }), found_icons })
}

/// Manifest problems only mean there are no manifest icons.
async fn manifest_icons(fetcher: &Fetcher, manifest_url: &Url) -> Vec<ManifestIcon> {
    fetcher.manifest(manifest_url).await.unwrap_or_else(|err| {
        tracing::info!(url = %Redacted(manifest_url), error = ?err, "Ignoring unusable manifest");
        Vec::new()
    })
}

/// Decode an inline `data:` icon. It is attributed to the page that
/// declared it and shares the page's expiry.
fn inline_image(source: &IconSource, page: &FetchedPage) -> Result<IconImage> {
    let data = DataUrl::parse(source.url().as_str()).or_raise(|| ErrorKind::InvalidInlineData)?;
    Ok(IconImage {
        source: page.url.clone(),
        content: Bytes::from(data.payload),
        content_type: data.media_type,
        expiry: page.expiry,
    })
}

/// URLs to try for a referenced icon, most likely first.
///
/// Relative link references are tried both against the page's directory and
/// against the site root, since sites get this wrong in both directions.
fn candidate_urls(source: &IconSource, base: &Url) -> Result<Vec<Url>> {
    match source {
        IconSource::Link(link) if is_relative(&link.href) => {
            resolve_relative(&link.href, base).or_raise(|| ErrorKind::Unresolvable)
        },
        _ => Ok(vec![source.url().clone()]),
    }
}
