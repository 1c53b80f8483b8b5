//! QualityScorer trait - a pure function from text and metadata to [0, 1].

use chrono::{DateTime, Utc};

use crate::error::ScoreError;
use crate::types::content::ExtractedText;

/// What the scorer knows about a source besides its text.
#[derive(Debug, Clone)]
pub struct SourceMetadata<'a> {
    /// Normalized URL
    pub url: &'a str,
    /// Mission topic
    pub topic: &'a str,
    /// Lowercased topic words
    pub keywords: &'a [String],
    /// Position in the candidate ordering
    pub position: usize,
    pub content_type: Option<&'a str>,
    pub fetched_at: DateTime<Utc>,
}

/// Scores extracted text for relevance and quality.
///
/// The controller calls this exactly once per successfully extracted attempt
/// and treats it as deterministic and side-effect free. Return
/// `ScoreError::content` for text that cannot be judged (the source scores 0)
/// and `ScoreError::configuration` when the scorer itself is broken (the
/// mission aborts).
pub trait QualityScorer: Send + Sync {
    fn score(&self, text: &ExtractedText, metadata: &SourceMetadata<'_>) -> Result<f64, ScoreError>;

    /// Scorer name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

impl<S: QualityScorer + ?Sized> QualityScorer for std::sync::Arc<S> {
    fn score(&self, text: &ExtractedText, metadata: &SourceMetadata<'_>) -> Result<f64, ScoreError> {
        (**self).score(text, metadata)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
