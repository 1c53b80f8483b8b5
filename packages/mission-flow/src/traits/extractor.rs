//! ContentExtractor trait - raw content in, normalized text out.

use async_trait::async_trait;

use crate::error::StageResult;
use crate::types::content::{ExtractedText, RawContent};

/// Turns raw fetched content into clean text.
///
/// Content that cannot be turned into text fails with `MalformedContent`.
/// Extractors that do I/O (remote rendering, OCR) may also report transient
/// kinds, which the controller retries like fetch failures.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, raw: &RawContent) -> StageResult<ExtractedText>;

    /// Extractor name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<E: ContentExtractor + ?Sized> ContentExtractor for std::sync::Arc<E> {
    async fn extract(&self, raw: &RawContent) -> StageResult<ExtractedText> {
        (**self).extract(raw).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
