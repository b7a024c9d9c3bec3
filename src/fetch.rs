//! Lazy, memoized data fetching shared between cards.
//!
//! Several cards often feed off one upstream call (the weather cards and
//! the header all need the same forecast response). A [`Fetcher`] wraps
//! the fetch future so that it runs at most once: the first `get` drives
//! it, every other caller awaits the same execution and receives a clone
//! of the memoized result. Errors are memoized too, so a failed fetch
//! stays failed for the lifetime of the fetcher.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// HTTP client used by the data sources, with a conservative timeout so a
/// slow upstream cannot stall the whole screen.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?)
}

/// A cloneable handle to a fetch that executes at most once.
///
/// ```
/// # use dayboard::fetch::Fetcher;
/// # futures::executor::block_on(async {
/// let fetcher = Fetcher::new(async { Ok::<_, dayboard::Error>(21) });
/// let (a, b) = (fetcher.get().await.unwrap(), fetcher.get().await.unwrap());
/// assert_eq!(a + b, 42);
/// # });
/// ```
pub struct Fetcher<T> {
    inner: Shared<BoxFuture<'static, Result<T>>>,
}

impl<T> Clone for Fetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Fetcher<T> {
    /// Wraps `fetch` without polling it. Execution starts with the first
    /// call to [`get`](Self::get).
    pub fn new<F>(fetch: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: fetch.boxed().shared(),
        }
    }

    /// Returns the fetched value, running the wrapped future if no caller
    /// has driven it to completion yet.
    pub async fn get(&self) -> Result<T> {
        self.inner.clone().await
    }
}
