//! Harvesting: drive each candidate through fetch -> extract -> score.
//!
//! Every candidate gets its own pipeline future that owns its
//! `SourceAttempt`. At most `concurrency` pipelines are polled at once
//! (`buffer_unordered`); results come back in completion order and are
//! re-sorted by position before the controller sees them.
//!
//! The mission deadline is enforced inside each pipeline with
//! `timeout_at`, so a timed-out pipeline abandons its in-flight fetch or
//! backoff sleep but still hands back its attempt (marked `Timeout`).
//! Pipelines still queued when the deadline passes never start: they come
//! back as `Timeout` without touching the fetcher.

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScoreError;
use crate::pipeline::planning::normalize_url;
use crate::pipeline::retry::RetryPolicy;
use crate::traits::extractor::ContentExtractor;
use crate::traits::fetcher::SourceFetcher;
use crate::traits::scorer::{QualityScorer, SourceMetadata};
use crate::types::attempt::{AttemptStage, FailureKind, SourceAttempt};

/// Shared, read-only inputs for every pipeline in one mission.
pub(crate) struct Harvest<'a> {
    pub fetcher: &'a dyn SourceFetcher,
    pub extractor: &'a dyn ContentExtractor,
    pub scorer: &'a dyn QualityScorer,
    pub retry: RetryPolicy,
    pub topic: &'a str,
    pub keywords: &'a [String],
    pub deadline: Instant,
}

/// Why harvesting stopped before every attempt came back.
#[derive(Debug)]
pub(crate) enum HarvestAbort {
    /// The cancellation token fired.
    Cancelled,
    /// The scorer reported a configuration error.
    Fatal { url: String, error: ScoreError },
}

enum PipelineOutcome {
    Finished(SourceAttempt),
    Fatal(SourceAttempt, ScoreError),
}

impl Harvest<'_> {
    /// Run every attempt to a terminal state.
    ///
    /// `on_finished` is called on the controller task as each attempt
    /// completes. The returned attempts are sorted by position.
    pub async fn run_all(
        &self,
        attempts: Vec<SourceAttempt>,
        concurrency: usize,
        cancel: &CancellationToken,
        mut on_finished: impl FnMut(&SourceAttempt),
    ) -> Result<Vec<SourceAttempt>, HarvestAbort> {
        let mut slots: Vec<Option<SourceAttempt>> = (0..attempts.len()).map(|_| None).collect();

        let mut pipelines = stream::iter(attempts)
            .map(|attempt| self.run_one(attempt))
            .buffer_unordered(concurrency.max(1));

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Harvest cancelled, dropping in-flight pipelines");
                    return Err(HarvestAbort::Cancelled);
                }

                next = pipelines.next() => match next {
                    Some(PipelineOutcome::Finished(attempt)) => {
                        on_finished(&attempt);
                        let position = attempt.position;
                        match slots.get_mut(position) {
                            Some(slot) => *slot = Some(attempt),
                            None => slots.push(Some(attempt)),
                        }
                    }
                    Some(PipelineOutcome::Fatal(attempt, error)) => {
                        return Err(HarvestAbort::Fatal { url: attempt.url, error });
                    }
                    None => break,
                }
            }
        }

        let mut finished: Vec<SourceAttempt> = slots.into_iter().flatten().collect();
        finished.sort_by_key(|a| a.position);
        Ok(finished)
    }

    async fn run_one(&self, mut attempt: SourceAttempt) -> PipelineOutcome {
        if Instant::now() >= self.deadline {
            debug!(url = %attempt.url, "Mission timeout reached before the attempt started");
            attempt.fail(FailureKind::Timeout, "mission timeout elapsed before the attempt started");
            return PipelineOutcome::Finished(attempt);
        }

        match tokio::time::timeout_at(self.deadline, self.drive(&mut attempt)).await {
            Ok(Ok(())) => PipelineOutcome::Finished(attempt),
            Ok(Err(error)) => PipelineOutcome::Fatal(attempt, error),
            Err(_) => {
                warn!(url = %attempt.url, stage = ?attempt.stage, "Mission timeout reached");
                attempt.fail(FailureKind::Timeout, "mission timeout elapsed before the attempt finished");
                PipelineOutcome::Finished(attempt)
            }
        }
    }

    /// Drive one attempt to a terminal stage. Only a fatal scorer error
    /// escapes; every other failure is recorded on the attempt.
    async fn drive(&self, attempt: &mut SourceAttempt) -> Result<(), ScoreError> {
        if normalize_url(&attempt.url).is_none() {
            debug!(url = %attempt.url, "Skipping candidate that is not an http(s) URL");
            attempt.fail(FailureKind::InvalidUrl, format!("not a fetchable http(s) URL: {}", attempt.url));
            return Ok(());
        }

        // Fetch what the caller wrote; the normalized form is only a dedup key
        let url = attempt.url.trim().to_string();

        attempt.stage = AttemptStage::Fetching;
        let fetcher = self.fetcher;
        let fetched = self
            .retry
            .run("fetch", &url, &mut attempt.fetch_attempts, || fetcher.fetch(&url))
            .await;
        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                attempt.record_error(&e);
                attempt.fail_with_last_error();
                return Ok(());
            }
        };

        attempt.stage = AttemptStage::Extracting;
        let extractor = self.extractor;
        let extracted = self
            .retry
            .run("extract", &url, &mut attempt.extract_attempts, || extractor.extract(&raw))
            .await;
        let text = match extracted {
            Ok(text) if text.text.trim().is_empty() => {
                attempt.fail(FailureKind::MalformedContent, "extracted text is empty");
                return Ok(());
            }
            Ok(text) => text,
            Err(e) => {
                attempt.record_error(&e);
                attempt.fail_with_last_error();
                return Ok(());
            }
        };

        attempt.stage = AttemptStage::Scoring;
        let metadata = SourceMetadata {
            url: &url,
            topic: self.topic,
            keywords: self.keywords,
            position: attempt.position,
            content_type: raw.content_type.as_deref(),
            fetched_at: raw.fetched_at,
        };

        let score = match self.scorer.score(&text, &metadata) {
            Ok(score) if score.is_nan() => {
                warn!(url = %url, "Scorer returned NaN, scoring as 0");
                attempt.score_error = Some("scorer returned NaN".to_string());
                0.0
            }
            Ok(score) => score.clamp(0.0, 1.0),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(url = %url, error = %e, "Scoring failed, scoring as 0");
                attempt.score_error = Some(e.message);
                0.0
            }
        };

        debug!(
            url = %url,
            score = score,
            words = text.word_count,
            fetch_attempts = attempt.fetch_attempts,
            extract_attempts = attempt.extract_attempts,
            "Source scored"
        );

        attempt.text = Some(text);
        attempt.succeed(score);
        Ok(())
    }
}
