//! The mission controller - main entry point for running a research mission.
//!
//! One call to [`MissionController::run`] takes a `MissionRequest` through
//! the whole lifecycle and hands back a `MissionRun`. The controller keeps no
//! per-mission state between calls; everything a mission touches lives on
//! the stack of that call.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{MissionError, Result, StorageError};
use crate::pipeline::aggregate::{aggregate, determine_status};
use crate::pipeline::harvest::{Harvest, HarvestAbort};
use crate::pipeline::lifecycle::{Lifecycle, MissionState};
use crate::pipeline::planning::plan_candidates;
use crate::pipeline::retry::RetryPolicy;
use crate::traits::{
    extractor::ContentExtractor,
    fetcher::{FetchCapability, SourceFetcher},
    observer::{MissionObserver, NoopObserver},
    scorer::QualityScorer,
    sink::{MissionLogger, ResultSink},
    summarizer::{ScoredSource, Summarizer},
};
use crate::types::{
    config::MissionConfig,
    request::MissionRequest,
    result::{MissionId, MissionResult, MissionRun, PersistenceReport, RunTiming},
};

/// Upper bound on a single `log_run` call.
pub const LOG_RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives missions through plan -> harvest -> score -> summarize -> persist.
///
/// # Example
///
/// ```rust,ignore
/// let controller = MissionController::new(
///     WebFetcher::direct(HttpFetcher::new()?),
///     HtmlExtractor::new(),
///     HeuristicScorer::new(),
///     ExtractiveSummarizer::new(),
///     sink.clone(),
///     sink,
/// )
/// .with_config(MissionConfig::default().with_concurrency(8));
///
/// let run = controller
///     .run(MissionRequest::new("wildfire AI").with_urls(urls))
///     .await?;
/// println!("{}: {:?}", run.result.status, run.result.summary);
/// ```
pub struct MissionController {
    fetcher: Arc<dyn SourceFetcher>,
    extractor: Arc<dyn ContentExtractor>,
    scorer: Arc<dyn QualityScorer>,
    summarizer: Arc<dyn Summarizer>,
    sink: Arc<dyn ResultSink>,
    logger: Arc<dyn MissionLogger>,
    observer: Arc<dyn MissionObserver>,
    config: MissionConfig,
}

impl MissionController {
    /// Create a controller with the default configuration.
    pub fn new(
        fetcher: impl SourceFetcher + 'static,
        extractor: impl ContentExtractor + 'static,
        scorer: impl QualityScorer + 'static,
        summarizer: impl Summarizer + 'static,
        sink: impl ResultSink + 'static,
        logger: impl MissionLogger + 'static,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            scorer: Arc::new(scorer),
            summarizer: Arc::new(summarizer),
            sink: Arc::new(sink),
            logger: Arc::new(logger),
            observer: Arc::new(NoopObserver),
            config: MissionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MissionConfig) -> Self {
        self.config = config;
        self
    }

    /// Receive lifecycle and per-attempt progress callbacks.
    pub fn with_observer(mut self, observer: impl MissionObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Capability of the configured fetcher, as recorded in results.
    pub fn fetcher_capability(&self) -> FetchCapability {
        self.fetcher.capability()
    }

    /// Run one mission to completion.
    ///
    /// Returns `Err` only when the mission aborts: invalid request or
    /// configuration, a scorer configuration error, or an illegal lifecycle
    /// transition. Every other outcome, including FAILED, is an `Ok`.
    pub async fn run(&self, request: MissionRequest) -> Result<MissionRun> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run one mission, aborting with `MissionError::Cancelled` if `cancel`
    /// fires before persistence starts.
    pub async fn run_with_cancel(
        &self,
        request: MissionRequest,
        cancel: CancellationToken,
    ) -> Result<MissionRun> {
        let mission_id = MissionId::generate();
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut lifecycle = Lifecycle::new();

        info!(
            mission_id = %mission_id,
            topic = %request.topic,
            candidates = request.candidate_urls.len(),
            fetcher = self.fetcher.name(),
            "Mission created"
        );

        // PLANNING
        self.transition(&mission_id, &mut lifecycle, MissionState::Planning)?;
        if let Err(e) = request.validate().and_then(|_| self.config.validate()) {
            return Err(self.abort(&mission_id, &mut lifecycle, e));
        }

        let plan = plan_candidates(&request);
        info!(
            mission_id = %mission_id,
            scheduled = plan.len(),
            duplicates = plan.duplicates_dropped,
            truncated = plan.truncated,
            "Candidates planned"
        );
        let attempts = plan.candidates.iter().map(|c| c.to_attempt()).collect();

        // HARVESTING
        self.transition(&mission_id, &mut lifecycle, MissionState::Harvesting)?;
        let keywords = request.keywords();
        let harvest = Harvest {
            fetcher: self.fetcher.as_ref(),
            extractor: self.extractor.as_ref(),
            scorer: self.scorer.as_ref(),
            retry: RetryPolicy::from_config(&self.config),
            topic: &request.topic,
            keywords: &keywords,
            deadline: clock + self.config.mission_timeout,
        };

        let harvested = harvest
            .run_all(attempts, self.config.concurrency, &cancel, |attempt| {
                debug!(
                    mission_id = %mission_id,
                    url = %attempt.url,
                    stage = ?attempt.stage,
                    attempts = attempt.attempt_count(),
                    "Attempt finished"
                );
                self.observer.on_attempt_finished(&mission_id, attempt);
            })
            .await;

        let attempts = match harvested {
            Ok(attempts) => attempts,
            Err(HarvestAbort::Cancelled) => {
                let e = MissionError::Cancelled {
                    state: lifecycle.state(),
                };
                return Err(self.abort(&mission_id, &mut lifecycle, e));
            }
            Err(HarvestAbort::Fatal { url, error }) => {
                let e = MissionError::fatal(
                    lifecycle.state(),
                    format!("scorer misconfigured (while scoring {url}): {}", error.message),
                );
                return Err(self.abort(&mission_id, &mut lifecycle, e));
            }
        };
        let harvest_finished_at = Utc::now();
        let harvest_elapsed = clock.elapsed();

        // SCORING_DONE
        self.transition(&mission_id, &mut lifecycle, MissionState::ScoringDone)?;
        let aggregation = aggregate(attempts, request.quality_threshold);
        info!(
            mission_id = %mission_id,
            successful = aggregation.successful.len(),
            excluded = aggregation.excluded.len(),
            threshold = request.quality_threshold,
            "Harvest aggregated"
        );

        // SUMMARIZING (skipped when nothing survived)
        let summarize_started = Instant::now();
        let mut summary = None;
        let mut summary_error = None;
        if aggregation.successful.is_empty() {
            info!(mission_id = %mission_id, "No source met the quality bar, skipping summarization");
        } else {
            self.transition(&mission_id, &mut lifecycle, MissionState::Summarizing)?;

            let sources: Vec<ScoredSource<'_>> = aggregation
                .successful
                .iter()
                .filter_map(|attempt| {
                    let text = attempt.text.as_ref()?;
                    Some(ScoredSource {
                        url: &attempt.url,
                        title: text.title.as_deref(),
                        text: &text.text,
                        score: attempt.score.unwrap_or_default(),
                    })
                })
                .collect();

            let summarized = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.summarizer.summarize(&request.topic, &sources, request.summary_style) => Some(result),
            };

            match summarized {
                None => {
                    let e = MissionError::Cancelled {
                        state: lifecycle.state(),
                    };
                    return Err(self.abort(&mission_id, &mut lifecycle, e));
                }
                Some(Ok(text)) => summary = Some(text),
                Some(Err(e)) => {
                    warn!(
                        mission_id = %mission_id,
                        summarizer = self.summarizer.name(),
                        error = %e,
                        "Summarization failed, degrading mission"
                    );
                    summary_error = Some(e.to_string());
                }
            }
        }
        let summarize_elapsed = summarize_started.elapsed();

        let status = determine_status(&aggregation, summary.is_some());

        // PERSISTING
        self.transition(&mission_id, &mut lifecycle, MissionState::Persisting)?;
        let completed_at = Utc::now();
        let result = MissionResult {
            mission_id: mission_id.clone(),
            topic: request.topic.clone(),
            summary_style: request.summary_style,
            fetcher_capability: self.fetcher.capability(),
            successful: aggregation.successful,
            excluded: aggregation.excluded,
            summary,
            summary_error,
            status,
            started_at,
            harvest_finished_at,
            completed_at,
        };
        let timing = RunTiming {
            started_at,
            finished_at: completed_at,
            harvest: harvest_elapsed,
            summarize: summarize_elapsed,
            total: clock.elapsed(),
            transitions: lifecycle.history().to_vec(),
        };
        let persistence = self.persist(&result, &timing).await;

        // DONE
        self.transition(&mission_id, &mut lifecycle, MissionState::Done)?;
        info!(
            mission_id = %mission_id,
            status = %result.status,
            successful = result.successful.len(),
            excluded = result.excluded.len(),
            persistence_errors = persistence.has_errors(),
            elapsed_ms = timing.total.as_millis() as u64,
            "Mission finished"
        );

        Ok(MissionRun {
            result,
            persistence,
        })
    }

    /// Write the result, then the run log. Neither failure changes status.
    async fn persist(&self, result: &MissionResult, timing: &RunTiming) -> PersistenceReport {
        let mut report = PersistenceReport::default();

        if let Err(e) = self.sink.persist_result(result).await {
            warn!(mission_id = %result.mission_id, error = %e, "Failed to persist mission result");
            report.result_error = Some(e.to_string());
        }

        let logged = tokio::time::timeout(LOG_RUN_TIMEOUT, self.logger.log_run(result, timing))
            .await
            .unwrap_or(Err(StorageError::TimedOut));
        if let Err(e) = logged {
            warn!(mission_id = %result.mission_id, error = %e, "Failed to record mission run");
            report.log_error = Some(e.to_string());
        }

        report
    }

    fn transition(
        &self,
        mission_id: &MissionId,
        lifecycle: &mut Lifecycle,
        next: MissionState,
    ) -> Result<()> {
        match lifecycle.advance(next) {
            Ok(from) => {
                info!(
                    mission_id = %mission_id,
                    from = %from,
                    to = %next,
                    progress = next.progress(),
                    "Mission state changed"
                );
                self.observer.on_transition(mission_id, from, next);
                Ok(())
            }
            Err(e) => Err(self.abort(mission_id, lifecycle, e)),
        }
    }

    /// Move to ABORTED and hand the error back for the caller to return.
    fn abort(&self, mission_id: &MissionId, lifecycle: &mut Lifecycle, error: MissionError) -> MissionError {
        let from = lifecycle.abort();
        error!(mission_id = %mission_id, state = %from, error = %error, "Mission aborted");
        if from != MissionState::Aborted {
            self.observer.on_transition(mission_id, from, MissionState::Aborted);
        }
        error
    }
}
