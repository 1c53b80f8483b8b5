//! Extractive summarizer.
//!
//! Picks key sentences across all surviving sources by position, length,
//! topic overlap, numeric content and source score, then lays them out in
//! the requested style.

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::SummarizeError;
use crate::traits::summarizer::{ScoredSource, Summarizer};
use crate::types::request::SummaryStyle;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// Sentences this short are navigation crumbs, captions and the like.
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_POINT_CHARS: usize = 150;
const MAX_DETAIL_SENTENCES: usize = 3;

/// Per-style layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleProfile {
    pub min_sentences: usize,
    pub max_sentences: usize,
    pub bullet_points: bool,
}

impl StyleProfile {
    pub fn for_style(style: SummaryStyle) -> Self {
        match style {
            SummaryStyle::Technical => Self {
                min_sentences: 5,
                max_sentences: 10,
                bullet_points: true,
            },
            SummaryStyle::Executive => Self {
                min_sentences: 3,
                max_sentences: 5,
                bullet_points: true,
            },
            SummaryStyle::Casual => Self {
                min_sentences: 4,
                max_sentences: 8,
                bullet_points: false,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate<'a> {
    source: usize,
    index: usize,
    sentence: &'a str,
    weight: f64,
}

/// Deterministic, offline `Summarizer`.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    include_sources: bool,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self {
            include_sources: true,
        }
    }

    /// Whether to append a source list to the digest.
    pub fn with_source_list(mut self, include: bool) -> Self {
        self.include_sources = include;
        self
    }

    fn rank<'a>(&self, topic: &str, sources: &[ScoredSource<'a>]) -> Vec<Candidate<'a>> {
        let topic_words: HashSet<String> = content_words(topic).collect();

        let mut candidates = Vec::new();
        for (source_idx, source) in sources.iter().enumerate() {
            let sentences = split_sentences(source.text);
            let total = sentences.len();
            for (index, sentence) in sentences.into_iter().enumerate() {
                let mut weight = 0.0;

                // Earlier sentences carry more of the page's point
                weight += (1.0 - (index as f64 / total as f64) * 0.5) * 0.3;

                let words = sentence.split_whitespace().count();
                if (10..=30).contains(&words) {
                    weight += 0.3;
                } else if words > 30 {
                    weight += 0.15;
                }

                if !topic_words.is_empty() {
                    let overlap = content_words(sentence)
                        .collect::<HashSet<_>>()
                        .intersection(&topic_words)
                        .count();
                    weight += (overlap as f64 * 0.15).min(0.4);
                }

                if sentence.chars().any(|c| c.is_ascii_digit()) {
                    weight += 0.1;
                }

                weight += source.score.clamp(0.0, 1.0) * 0.2;

                candidates.push(Candidate {
                    source: source_idx,
                    index,
                    sentence,
                    weight,
                });
            }
        }

        // Stable sort keeps source order among equal weights
        candidates.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        candidates
    }

    fn select<'a>(&self, ranked: Vec<Candidate<'a>>, profile: StyleProfile) -> Vec<Candidate<'a>> {
        let mut selected: Vec<Candidate<'a>> = ranked.iter().take(profile.max_sentences).cloned().collect();
        if selected.len() > profile.min_sentences {
            selected.retain(|c| c.weight >= 0.3);
        }
        if selected.len() < profile.min_sentences {
            selected = ranked.into_iter().take(profile.min_sentences).collect();
        }
        // Present in reading order
        selected.sort_by_key(|c| (c.source, c.index));
        selected
    }

    fn format(&self, topic: &str, selected: &[Candidate<'_>], sources: &[ScoredSource<'_>], profile: StyleProfile) -> String {
        let mut parts = vec![format!("# {topic}"), String::new()];

        if profile.bullet_points {
            let points: Vec<&Candidate<'_>> = selected.iter().take(5).collect();
            parts.push("## Key Points".to_string());
            parts.push(String::new());
            for point in &points {
                parts.push(format!("- {}", truncate(point.sentence, MAX_POINT_CHARS)));
            }

            let details: Vec<&str> = selected
                .iter()
                .skip(points.len())
                .take(MAX_DETAIL_SENTENCES)
                .map(|c| c.sentence)
                .collect();
            if !details.is_empty() {
                parts.push(String::new());
                parts.push("## Details".to_string());
                parts.push(String::new());
                parts.push(details.join(" "));
            }
        } else {
            let narrative: Vec<&str> = selected.iter().map(|c| c.sentence).collect();
            parts.push(narrative.join(" "));
        }

        if self.include_sources {
            parts.push(String::new());
            parts.push("## Sources".to_string());
            parts.push(String::new());
            for source in sources {
                let label = source.title.unwrap_or(source.url);
                parts.push(format!("- {label} <{}> (score {:.2})", source.url, source.score));
            }
        }

        parts.join("\n")
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(
        &self,
        topic: &str,
        sources: &[ScoredSource<'_>],
        style: SummaryStyle,
    ) -> Result<String, SummarizeError> {
        if sources.is_empty() {
            return Err(SummarizeError::unavailable("no sources to summarize"));
        }

        let profile = StyleProfile::for_style(style);
        let ranked = self.rank(topic, sources);
        if ranked.is_empty() {
            return Err(SummarizeError::unavailable(
                "sources contain no summarizable sentences",
            ));
        }

        let candidates = ranked.len();
        let selected = self.select(ranked, profile);
        let summary = self.format(topic, &selected, sources, profile);

        debug!(
            style = %style,
            candidates = candidates,
            selected = selected.len(),
            chars = summary.len(),
            "Summary composed"
        );
        Ok(summary)
    }

    fn name(&self) -> &str {
        "extractive"
    }
}

/// Split text into sentences, skipping markdown headings and fragments.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut start = 0;
        for m in SENTENCE_END.find_iter(line) {
            let end = m.start() + m.as_str().trim_end().len();
            sentences.push(line[start..end].trim());
            start = m.end();
        }
        sentences.push(line[start..].trim());
    }
    sentences.retain(|s| s.chars().count() > MIN_SENTENCE_CHARS);
    sentences
}

/// Lowercased words of two or more characters, minus common stopwords.
fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    const STOPWORDS: &[&str] = &[
        "the", "and", "for", "with", "from", "are", "was", "were", "been", "being", "have", "has",
        "had", "does", "did", "will", "would", "could", "should", "may", "might", "can", "this",
        "that", "these", "those", "its", "they", "them", "their", "our", "you", "your", "his",
        "her", "who", "what", "when", "where", "why", "how", "all", "each", "every", "some", "any",
        "but", "not",
    ];
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

fn truncate(sentence: &str, max_chars: usize) -> String {
    if sentence.chars().count() <= max_chars {
        return sentence.to_string();
    }
    let cut: String = sentence.chars().take(max_chars - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRE: &str = "Wildfire detection systems now use AI to scan satellite imagery every five minutes. \
        Crews in California received alerts 40 minutes earlier than with lookout towers. \
        The models were trained on 12 years of thermal data from three satellites. \
        False alarms remain a problem near industrial sites with heat plumes. \
        Funding for the program was renewed last spring by the state. \
        Researchers plan to add drone feeds to the AI pipeline next year.";

    const SMOKE: &str = "Smoke forecasting helps hospitals prepare for respiratory cases during wildfire season. \
        Forecasts combine wind data with fire perimeter estimates from AI models. \
        Accuracy drops sharply beyond 48 hours.";

    fn sources() -> Vec<ScoredSource<'static>> {
        vec![
            ScoredSource {
                url: "https://a.org/fire",
                title: Some("Fire AI"),
                text: FIRE,
                score: 0.8,
            },
            ScoredSource {
                url: "https://b.org/smoke",
                title: None,
                text: SMOKE,
                score: 0.6,
            },
        ]
    }

    #[test]
    fn test_split_sentences_keeps_punctuation_and_skips_headings() {
        let text = "## Methods\n\nShort one. This sentence is long enough to keep! And so is this one, clearly?";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec!["This sentence is long enough to keep!", "And so is this one, clearly?"]
        );
    }

    #[tokio::test]
    async fn test_executive_summary_uses_bullets_within_budget() {
        let summary = ExtractiveSummarizer::new()
            .summarize("wildfire AI", &sources(), SummaryStyle::Executive)
            .await
            .unwrap();

        assert!(summary.starts_with("# wildfire AI"));
        assert!(summary.contains("## Key Points"));
        let bullets = summary
            .lines()
            .take_while(|l| !l.starts_with("## Sources"))
            .filter(|l| l.starts_with("- "))
            .count();
        assert!((3..=5).contains(&bullets), "got {bullets} bullets");
        assert!(summary.contains("- Fire AI <https://a.org/fire> (score 0.80)"));
        assert!(summary.contains("- https://b.org/smoke <https://b.org/smoke> (score 0.60)"));
    }

    #[tokio::test]
    async fn test_casual_summary_is_narrative() {
        let summary = ExtractiveSummarizer::new()
            .with_source_list(false)
            .summarize("wildfire AI", &sources(), SummaryStyle::Casual)
            .await
            .unwrap();

        assert!(!summary.contains("## Key Points"));
        assert!(!summary.contains("## Sources"));
        assert!(summary.contains("Wildfire detection systems now use AI"));
    }

    #[tokio::test]
    async fn test_summary_is_deterministic() {
        let s = ExtractiveSummarizer::new();
        let a = s.summarize("wildfire AI", &sources(), SummaryStyle::Technical).await.unwrap();
        let b = s.summarize("wildfire AI", &sources(), SummaryStyle::Technical).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_no_sentences_is_unavailable() {
        let short = [ScoredSource {
            url: "https://a.org/",
            title: None,
            text: "Too short.",
            score: 0.9,
        }];
        let err = ExtractiveSummarizer::new()
            .summarize("wildfire", &short, SummaryStyle::Technical)
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Unavailable { .. }));
    }

    #[test]
    fn test_truncate_long_points() {
        let long = "x".repeat(200);
        let cut = truncate(&long, MAX_POINT_CHARS);
        assert_eq!(cut.chars().count(), MAX_POINT_CHARS);
        assert!(cut.ends_with("..."));
    }
}
