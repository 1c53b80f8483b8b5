//! Fetcher implementations.
//!
//! - `HttpFetcher` - fetch exactly the requested URL
//! - `LinkFollowingFetcher` - also fold in same-host linked pages
//! - `RateLimitedFetcher` - governor quota around any fetcher
//! - `WebFetcher` - either of the first two, chosen at construction time

pub mod http;
pub mod link_following;
pub mod rate_limited;

use async_trait::async_trait;

pub use http::{classify_status, HttpFetcher, DEFAULT_USER_AGENT};
pub use link_following::LinkFollowingFetcher;
pub use rate_limited::{FetcherExt, RateLimitedFetcher};

use crate::error::StageResult;
use crate::traits::fetcher::{FetchCapability, SourceFetcher};
use crate::types::content::RawContent;

/// A web fetcher whose capability is fixed when it is built.
///
/// The controller sees one `SourceFetcher`; which variant it got only shows
/// up as `MissionResult::fetcher_capability`.
#[derive(Debug, Clone)]
pub enum WebFetcher {
    Direct(HttpFetcher),
    Exploratory(LinkFollowingFetcher),
}

impl WebFetcher {
    pub fn direct(http: HttpFetcher) -> Self {
        Self::Direct(http)
    }

    pub fn exploratory(http: HttpFetcher) -> Self {
        Self::Exploratory(LinkFollowingFetcher::new(http))
    }

    /// Pick a variant from a capability flag.
    pub fn for_capability(capability: FetchCapability, http: HttpFetcher) -> Self {
        match capability {
            FetchCapability::Direct => Self::direct(http),
            FetchCapability::Exploratory => Self::exploratory(http),
        }
    }
}

#[async_trait]
impl SourceFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        match self {
            WebFetcher::Direct(f) => f.fetch(url).await,
            WebFetcher::Exploratory(f) => f.fetch(url).await,
        }
    }

    fn capability(&self) -> FetchCapability {
        match self {
            WebFetcher::Direct(_) => FetchCapability::Direct,
            WebFetcher::Exploratory(_) => FetchCapability::Exploratory,
        }
    }

    fn name(&self) -> &str {
        match self {
            WebFetcher::Direct(f) => f.name(),
            WebFetcher::Exploratory(f) => f.name(),
        }
    }
}
