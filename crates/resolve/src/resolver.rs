use crate::favicon::load_favicon_ico;
use crate::merge::merge;
use crate::models::LoadResult;
use crate::page::load_from_page;
use crate::params::{PixelRatio, SizeParam};
use favr_fetch::Fetcher;
use favr_url::Redacted;
use tracing::instrument;
use url::Url;

/// Runs both discovery strategies for a site and merges their results.
#[derive(Clone)]
pub struct Resolver {
    fetcher: Fetcher,
}

impl Resolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Find the best icon for `url`. Finding nothing is a normal outcome,
    /// reported as a result without an icon.
    #[instrument(skip(self), fields(url = %Redacted(url), %size, %dpr))]
    pub async fn load(&self, url: &Url, size: SizeParam, dpr: PixelRatio) -> LoadResult {
        let (favicon, page) =
            futures::join!(load_favicon_ico(&self.fetcher, url), load_from_page(&self.fetcher, url, size, dpr));
        let result = merge(url, favicon, page);
        tracing::info!(found = result.icon.is_some(), candidates = result.found_icons.len(), "Resolved icon");
        result
    }
}
