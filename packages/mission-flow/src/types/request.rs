//! Mission request - what the caller asks for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MissionError;

/// Narrative style requested for the final digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    /// Formal and precise: methodology, data, specifics.
    #[default]
    Technical,
    /// Concise and actionable: key insights and implications.
    Executive,
    /// Conversational: main ideas, no bullet points.
    Casual,
}

impl SummaryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Technical => "technical",
            SummaryStyle::Executive => "executive",
            SummaryStyle::Casual => "casual",
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(SummaryStyle::Technical),
            "executive" => Ok(SummaryStyle::Executive),
            "casual" => Ok(SummaryStyle::Casual),
            other => Err(format!("unknown summary style: {other}")),
        }
    }
}

/// A research mission request.
///
/// Immutable once handed to the controller: `MissionController::run` takes it
/// by value and nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRequest {
    /// Research topic or question
    pub topic: String,

    /// Candidate URLs in priority order
    #[serde(default)]
    pub candidate_urls: Vec<String>,

    /// Upper bound on sources attempted
    pub max_sources: usize,

    /// Minimum score for a source to reach the summarizer, in [0, 1]
    pub quality_threshold: f64,

    /// Digest style
    #[serde(default)]
    pub summary_style: SummaryStyle,
}

impl MissionRequest {
    /// Create a request with defaults: 5 sources, threshold 0.5, technical style.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            candidate_urls: Vec::new(),
            max_sources: 5,
            quality_threshold: 0.5,
            summary_style: SummaryStyle::default(),
        }
    }

    /// Append a candidate URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.candidate_urls.push(url.into());
        self
    }

    /// Append several candidate URLs, preserving their order.
    pub fn with_urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.candidate_urls.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_style(mut self, style: SummaryStyle) -> Self {
        self.summary_style = style;
        self
    }

    /// Lowercased topic words used as relevance keywords.
    pub fn keywords(&self) -> Vec<String> {
        self.topic
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// Check the request before a mission starts.
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.topic.trim().is_empty() {
            return Err(MissionError::invalid("topic must not be empty"));
        }
        if self.max_sources == 0 {
            return Err(MissionError::invalid("max_sources must be greater than zero"));
        }
        if self.candidate_urls.is_empty() {
            return Err(MissionError::invalid("candidate URL list is empty"));
        }
        if !self.quality_threshold.is_finite() || !(0.0..=1.0).contains(&self.quality_threshold)
        {
            return Err(MissionError::invalid(format!(
                "quality_threshold must be within [0, 1], got {}",
                self.quality_threshold
            )));
        }
        Ok(())
    }
}
