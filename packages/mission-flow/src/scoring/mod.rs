//! Heuristic quality scoring.
//!
//! A weighted composite of three deterministic signals:
//! - keyword relevance: share of topic keywords present in the text
//! - text quality: length, casing, sentence variety, vocabulary
//! - readability: distance from ~17.5 words/sentence and ~5 chars/word

use std::collections::HashSet;

use crate::error::ScoreError;
use crate::traits::scorer::{QualityScorer, SourceMetadata};
use crate::types::content::ExtractedText;

/// Composite weights. Must be finite, non-negative, and not all zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub relevance: f64,
    pub quality: f64,
    pub readability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            relevance: 2.0,
            quality: 1.0,
            readability: 0.5,
        }
    }
}

impl ScoreWeights {
    fn validate(&self) -> Result<f64, ScoreError> {
        let weights = [self.relevance, self.quality, self.readability];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoreError::configuration(format!(
                "score weights must be finite and non-negative, got {self:?}"
            )));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ScoreError::configuration("score weights sum to zero"));
        }
        Ok(total)
    }
}

/// Default `QualityScorer`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    weights: ScoreWeights,
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl QualityScorer for HeuristicScorer {
    fn score(&self, text: &ExtractedText, metadata: &SourceMetadata<'_>) -> Result<f64, ScoreError> {
        let total_weight = self.weights.validate()?;
        if text.word_count == 0 {
            return Err(ScoreError::content("no words to score"));
        }

        let relevance = keyword_relevance(&text.text, metadata.keywords);
        let quality = text_quality(&text.text);
        let readability = readability(&text.text);

        let weighted = relevance * self.weights.relevance
            + quality * self.weights.quality
            + readability * self.weights.readability;

        Ok((weighted / total_weight).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Fraction of `keywords` that appear as whole words in `text`.
pub fn keyword_relevance(text: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let words: HashSet<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let matches = keywords
        .iter()
        .filter(|k| words.contains(&k.to_lowercase()))
        .count();
    matches as f64 / keywords.len() as f64
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Length, casing, sentence variety and vocabulary richness, from 0.5 up.
pub fn text_quality(text: &str) -> f64 {
    let chars = text.chars().count();
    if chars < 20 {
        return 0.0;
    }

    let mut score: f64 = 0.5;

    if (100..=5000).contains(&chars) {
        score += 0.15;
    } else if chars > 5000 {
        score += 0.10;
    }

    let uppercase = text.chars().filter(|c| c.is_uppercase()).count();
    if (uppercase as f64 / chars as f64) < 0.3 {
        score += 0.15;
    }

    let sentences = sentences(text);
    if sentences.len() >= 2 {
        let lengths: Vec<f64> = sentences.iter().map(|s| s.chars().count() as f64).collect();
        let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
        let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
        if variance > 100.0 {
            score += 0.10;
        }
    }

    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    if !words.is_empty() {
        let unique: HashSet<&String> = words.iter().collect();
        if unique.len() as f64 / words.len() as f64 > 0.5 {
            score += 0.10;
        }
    }

    score.min(1.0)
}

/// Simplified reading-ease estimate in [0, 1].
pub fn readability(text: &str) -> f64 {
    let sentence_count = sentences(text).len();
    let words: Vec<&str> = text.split_whitespace().collect();
    if sentence_count == 0 || words.is_empty() {
        return 0.0;
    }

    let avg_sentence_len = words.len() as f64 / sentence_count as f64;
    let avg_word_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;

    let sentence_score = 1.0 - ((avg_sentence_len - 17.5).abs() / 50.0).min(1.0);
    let word_score = 1.0 - ((avg_word_len - 5.0).abs() / 10.0).min(1.0);

    ((sentence_score + word_score) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta<'a>(keywords: &'a [String]) -> SourceMetadata<'a> {
        SourceMetadata {
            url: "https://example.com/",
            topic: "wildfire ai",
            keywords,
            position: 0,
            content_type: Some("text/html"),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_keyword_relevance_counts_whole_words() {
        let keywords = vec!["ai".to_string(), "ml".to_string(), "robots".to_string()];
        let score = keyword_relevance("AI and ML are cool", &keywords);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);

        // "said" does not contain the word "ai"
        assert_eq!(keyword_relevance("she said so", &keywords[..1]), 0.0);
        assert_eq!(keyword_relevance("anything", &[]), 0.0);
    }

    #[test]
    fn test_text_quality() {
        assert_eq!(text_quality("too short"), 0.0);

        let shouting = "THIS IS ALL CAPS AND VERY LOUD TEXT";
        let calm = "This is calm text with a few different words in it";
        assert!(text_quality(calm) > text_quality(shouting));
        assert!(text_quality(&"word ".repeat(2000)) <= 1.0);
    }

    #[test]
    fn test_readability_prefers_moderate_sentences() {
        let moderate = "Thermal cameras detect wildfire smoke early in dry seasons. \
                        Crews respond faster when alerts arrive within minutes of ignition.";
        let run_on = "a ".repeat(200);
        assert!(readability(moderate) > readability(&run_on));
        assert_eq!(readability(""), 0.0);
    }

    #[test]
    fn test_score_in_unit_range_and_relevance_weighted() {
        let keywords = vec!["wildfire".to_string(), "ai".to_string()];
        let scorer = HeuristicScorer::new();

        let relevant = ExtractedText::new(
            "Wildfire detection with AI has improved. Satellite models flag smoke plumes \
             within minutes, and ground crews get alerts before fires spread.",
        );
        let off_topic = ExtractedText::new(
            "Sourdough bread needs patience. Feed the starter daily and keep it warm \
             so the loaf rises well before baking.",
        );

        let a = scorer.score(&relevant, &meta(&keywords)).unwrap();
        let b = scorer.score(&off_topic, &meta(&keywords)).unwrap();
        assert!((0.0..=1.0).contains(&a));
        assert!((0.0..=1.0).contains(&b));
        assert!(a > b);
        assert!(a >= 0.5, "relevant text scored {a}");
    }

    #[test]
    fn test_bad_weights_are_a_configuration_error() {
        let keywords = vec!["wildfire".to_string()];
        let scorer = HeuristicScorer::new().with_weights(ScoreWeights {
            relevance: 0.0,
            quality: 0.0,
            readability: 0.0,
        });
        let err = scorer
            .score(&ExtractedText::new("some words here"), &meta(&keywords))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_text_is_a_content_error() {
        let keywords = vec!["wildfire".to_string()];
        let err = HeuristicScorer::new()
            .score(&ExtractedText::new("   "), &meta(&keywords))
            .unwrap_err();
        assert!(!err.is_fatal());
    }
}
