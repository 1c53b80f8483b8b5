//! Content types - raw fetched content and extracted text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Raw content as returned by a `SourceFetcher`, before extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawContent {
    /// URL that was requested
    pub url: String,

    /// Final URL after redirects, when it differs
    pub final_url: Option<String>,

    /// Response body (usually HTML)
    pub body: String,

    /// MIME type reported by the source
    pub content_type: Option<String>,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,

    /// Source-specific metadata (HTTP status, headers)
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Related pages folded in by an exploratory fetcher
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked: Vec<RawContent>,
}

impl RawContent {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            final_url: None,
            body: body.into(),
            content_type: None,
            fetched_at: Utc::now(),
            metadata: HashMap::new(),
            linked: Vec::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = Some(final_url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_linked(mut self, page: RawContent) -> Self {
        self.linked.push(page);
        self
    }

    /// Check if the body has anything besides whitespace.
    pub fn has_content(&self) -> bool {
        !self.body.trim().is_empty()
    }
}

/// Normalized text produced by a `ContentExtractor`.
///
/// Owned exclusively by the `SourceAttempt` that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Clean text body
    pub text: String,

    /// Page title if one was found
    pub title: Option<String>,

    /// Whitespace-delimited word count of `text`
    pub word_count: usize,

    /// SHA-256 of `text`
    pub content_hash: String,

    /// Descriptive metadata (author, description, site name...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            word_count: text.split_whitespace().count(),
            content_hash: Self::hash_content(&text),
            text,
            title: None,
            metadata: HashMap::new(),
        }
    }

    /// Calculate SHA-256 hash of content.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_text_counts_words() {
        let text = ExtractedText::new("  Thermal cameras   spot fires early. ");
        assert_eq!(text.word_count, 5);
        assert_eq!(text.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(
            ExtractedText::hash_content("same"),
            ExtractedText::new("same").content_hash
        );
    }

    #[test]
    fn test_raw_content_builder() {
        let raw = RawContent::new("https://example.com", "<p>hi</p>")
            .with_content_type("text/html")
            .with_metadata("http_status", "200");
        assert!(raw.has_content());
        assert_eq!(raw.content_type.as_deref(), Some("text/html"));
        assert_eq!(raw.metadata.get("http_status").map(String::as_str), Some("200"));
    }
}
