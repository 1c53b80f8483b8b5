//! Rate-limited fetcher wrapper.
//!
//! Wraps any `SourceFetcher` with a shared governor rate limit, so parallel
//! pipelines do not hammer the network faster than the configured quota.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::StageResult;
use crate::traits::fetcher::{FetchCapability, SourceFetcher};
use crate::types::content::RawContent;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A fetcher wrapper that enforces a requests-per-second quota.
pub struct RateLimitedFetcher<F: SourceFetcher> {
    inner: F,
    limiter: Arc<DefaultRateLimiter>,
}

impl<F: SourceFetcher> RateLimitedFetcher<F> {
    /// Limit `fetcher` to `requests_per_second` sustained requests.
    pub fn new(fetcher: F, requests_per_second: NonZeroU32) -> Self {
        Self::with_quota(fetcher, Quota::per_second(requests_per_second))
    }

    /// Sustained rate with a burst allowance.
    pub fn with_burst(fetcher: F, requests_per_second: NonZeroU32, burst: NonZeroU32) -> Self {
        Self::with_quota(
            fetcher,
            Quota::per_second(requests_per_second).allow_burst(burst),
        )
    }

    pub fn with_quota(fetcher: F, quota: Quota) -> Self {
        Self {
            inner: fetcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: SourceFetcher> SourceFetcher for RateLimitedFetcher<F> {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        self.limiter.until_ready().await;
        self.inner.fetch(url).await
    }

    fn capability(&self) -> FetchCapability {
        self.inner.capability()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy rate limiting.
pub trait FetcherExt: SourceFetcher + Sized {
    fn rate_limited(self, requests_per_second: NonZeroU32) -> RateLimitedFetcher<Self> {
        RateLimitedFetcher::new(self, requests_per_second)
    }
}

impl<F: SourceFetcher + Sized> FetcherExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Instant;

    #[tokio::test]
    async fn test_rate_limiting() {
        let mock = MockFetcher::new()
            .with_page("https://example.com/1", "<p>one</p>")
            .with_page("https://example.com/2", "<p>two</p>")
            .with_page("https://example.com/3", "<p>three</p>");

        let fetcher = mock.rate_limited(NonZeroU32::new(2).unwrap());

        let start = Instant::now();
        for url in ["https://example.com/1", "https://example.com/2", "https://example.com/3"] {
            fetcher.fetch(url).await.unwrap();
        }
        let elapsed = start.elapsed();

        // First is immediate, the 2nd and 3rd wait for the quota
        assert!(elapsed.as_millis() >= 500, "Rate limiting not working: {:?}", elapsed);
        assert_eq!(fetcher.inner().calls().len(), 3);
    }

    #[test]
    fn test_delegates_capability() {
        let fetcher = MockFetcher::new()
            .with_capability(FetchCapability::Exploratory)
            .rate_limited(NonZeroU32::new(5).unwrap());
        assert_eq!(fetcher.capability(), FetchCapability::Exploratory);
    }
}
