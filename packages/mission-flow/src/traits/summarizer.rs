//! Summarizer trait - turns the surviving sources into one digest.

use async_trait::async_trait;

use crate::error::SummarizeError;
use crate::types::request::SummaryStyle;

/// One scored source handed to the summarizer.
///
/// Borrows from the attempt that owns the text.
#[derive(Debug, Clone, Copy)]
pub struct ScoredSource<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub text: &'a str,
    pub score: f64,
}

/// Produces a narrative digest from scored texts.
///
/// Called at most once per mission, with sources in candidate order. A
/// failure degrades the mission to PARTIAL; it never aborts it.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        topic: &str,
        sources: &[ScoredSource<'_>],
        style: SummaryStyle,
    ) -> Result<String, SummarizeError>;

    /// Summarizer name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<S: Summarizer + ?Sized> Summarizer for std::sync::Arc<S> {
    async fn summarize(
        &self,
        topic: &str,
        sources: &[ScoredSource<'_>],
        style: SummaryStyle,
    ) -> Result<String, SummarizeError> {
        (**self).summarize(topic, sources, style).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
