//! Byte-ceiling enforcement for chunked streams.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::Stream;
use pin_project_lite::pin_project;
use std::error::Error as StdError;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

pin_project! {
    /// Wraps a fallible stream of byte chunks and fails once the running total
    /// exceeds `limit`.
    ///
    /// The chunk that crosses the ceiling is never yielded. After the error (or
    /// the end of the inner stream) the adapter is fused and the inner stream
    /// is no longer polled, so nothing more is pulled off the connection.
    /// Dropping the adapter drops the inner stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use favr_asyncutils::BoundedStreamExt;
    /// use futures::{StreamExt, stream};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let chunks = stream::iter([Ok::<_, std::io::Error>(vec![0u8; 4]), Ok(vec![0u8; 4])]);
    /// let mut bounded = chunks.bounded(6);
    /// assert!(bounded.next().await.unwrap().is_ok());
    /// assert!(bounded.next().await.unwrap().is_err());
    /// assert!(bounded.next().await.is_none());
    /// # }
    /// ```
    pub struct BoundedStream<S> {
        #[pin]
        inner: S,
        limit: usize,
        received: usize,
        done: bool,
    }
}

impl<S> BoundedStream<S> {
    pub fn new(inner: S, limit: usize) -> Self {
        Self { inner, limit, received: 0, done: false }
    }

    /// Total bytes yielded so far.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<S, B, E> Stream for BoundedStream<S>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: StdError + Send + Sync + 'static,
{
    type Item = Result<B>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                *this.received = this.received.saturating_add(chunk.as_ref().len());
                if *this.received > *this.limit {
                    *this.done = true;
                    let limit = *this.limit;
                    return Poll::Ready(Some(Err(exn::Exn::from(ErrorKind::LimitExceeded { limit }))));
                }
                Poll::Ready(Some(Ok(chunk)))
            },
            Some(Err(err)) => {
                *this.done = true;
                Poll::Ready(Some(Err(err).or_raise(|| ErrorKind::Stream)))
            },
            None => {
                *this.done = true;
                Poll::Ready(None)
            },
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.done {
            true => (0, Some(0)),
            false => (0, self.inner.size_hint().1.map(|upper| upper.saturating_add(1))),
        }
    }
}

/// Extension trait adding [`bounded`](BoundedStreamExt::bounded) to any stream.
pub trait BoundedStreamExt: Sized {
    /// Fail with [`LimitExceeded`](ErrorKind::LimitExceeded) once more than
    /// `limit` bytes have been received.
    fn bounded(self, limit: usize) -> BoundedStream<Self> {
        BoundedStream::new(self, limit)
    }
}

impl<S: Stream> BoundedStreamExt for S {}
