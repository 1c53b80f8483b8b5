//! SourceFetcher trait - the one way the controller gets raw content.
//!
//! Whether a fetcher fetches exactly the URL it is given or explores related
//! pages is a property of the implementation, chosen when the controller is
//! built. The controller never branches on it; it only records the
//! capability in the mission result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StageResult;
use crate::types::content::RawContent;

/// What a fetcher does with the URL it is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchCapability {
    /// Fetch exactly the requested URL.
    #[default]
    Direct,
    /// Fetch the URL and fold in related pages it links to.
    Exploratory,
}

impl fmt::Display for FetchCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchCapability::Direct => f.write_str("direct"),
            FetchCapability::Exploratory => f.write_str("exploratory"),
        }
    }
}

/// Fetches raw content for a single URL.
///
/// Failures must be classified into `NetworkTimeout`, `TemporaryServerError`
/// or `PermanentError`; the controller retries only the first two.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch one URL.
    async fn fetch(&self, url: &str) -> StageResult<RawContent>;

    fn capability(&self) -> FetchCapability {
        FetchCapability::Direct
    }

    /// Fetcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<F: SourceFetcher + ?Sized> SourceFetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        (**self).fetch(url).await
    }

    fn capability(&self) -> FetchCapability {
        (**self).capability()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
