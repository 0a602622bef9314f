//! Precedence-ordered racing of candidate fetches.

use crate::error::{ErrorKind, Result};
use crate::fetcher::Fetcher;
use crate::image::IconImage;
use favr_url::Redacted;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;
use tracing::instrument;
use url::Url;

enum Slot<T> {
    Pending,
    Failed,
    Ready(T),
}

enum Scan<T> {
    /// A slot ahead of any success is still pending.
    Waiting,
    Winner(usize, T),
    /// Every slot failed.
    Exhausted,
}

/// Walk the slots in precedence order: skip failures, stop at the first
/// pending slot, take the first success.
fn scan<T>(slots: &mut [Slot<T>]) -> Scan<T> {
    for (index, slot) in slots.iter_mut().enumerate() {
        match std::mem::replace(slot, Slot::Failed) {
            Slot::Failed => {},
            Slot::Pending => {
                *slot = Slot::Pending;
                return Scan::Waiting;
            },
            Slot::Ready(value) => return Scan::Winner(index, value),
        }
    }
    Scan::Exhausted
}

/// Run `fetch` for every candidate concurrently and return the
/// highest-precedence success, together with the candidate that produced it.
///
/// Precedence is position in `candidates`, never completion order: a later
/// candidate that finishes first is held back until every candidate ahead of
/// it has failed. Each fetch runs as its own task, so once a winner is chosen
/// the losers are left to finish (or time out) on their own.
pub async fn first_success<T, F, Fut>(candidates: &[Url], fetch: F) -> Result<(Url, T)>
where
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut slots: Vec<Slot<T>> = candidates.iter().map(|_| Slot::Pending).collect();
    let mut running: FuturesUnordered<_> = candidates
        .iter()
        .enumerate()
        .map(|(index, url)| {
            let task = tokio::spawn(fetch(url.clone()));
            async move { (index, task.await) }
        })
        .collect();

    loop {
        match scan(&mut slots) {
            Scan::Winner(index, value) => return Ok((candidates[index].clone(), value)),
            Scan::Exhausted => exn::bail!(ErrorKind::NoValidImage),
            Scan::Waiting => {},
        }
        let Some((index, outcome)) = running.next().await else {
            // Unreachable while a slot is pending, but don't spin if it happens.
            exn::bail!(ErrorKind::NoValidImage);
        };
        slots[index] = match outcome {
            Ok(Ok(value)) => Slot::Ready(value),
            Ok(Err(err)) => {
                tracing::debug!(url = %Redacted(&candidates[index]), error = ?err, "Candidate failed");
                Slot::Failed
            },
            Err(err) => {
                tracing::debug!(url = %Redacted(&candidates[index]), error = %err, "Candidate task failed");
                Slot::Failed
            },
        };
    }
}

impl Fetcher {
    /// Race image fetches for `candidates`; see [`first_success`].
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn first_valid_image(&self, candidates: &[Url]) -> Result<(Url, IconImage)> {
        first_success(candidates, |url| {
            let fetcher = self.clone();
            async move { fetcher.image(&url).await }
        })
        .await
    }
}
