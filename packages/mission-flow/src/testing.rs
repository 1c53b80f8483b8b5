//! Testing utilities including mock implementations.
//!
//! These are useful for exercising the controller (or code built on it)
//! without touching the network or the filesystem. Every mock records the
//! calls it receives so tests can assert on them.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::error::{ScoreError, StageError, StageResult, StorageError, StorageResult, SummarizeError};
use crate::pipeline::lifecycle::{MissionState, StateTransition};
use crate::pipeline::planning::normalize_url;
use crate::traits::{
    extractor::ContentExtractor,
    fetcher::{FetchCapability, SourceFetcher},
    observer::MissionObserver,
    scorer::{QualityScorer, SourceMetadata},
    sink::{MissionLogger, ResultSink},
    summarizer::{ScoredSource, Summarizer},
};
use crate::types::{
    attempt::{AttemptStage, SourceAttempt},
    content::{ExtractedText, RawContent},
    request::SummaryStyle,
    result::{MissionId, MissionResult, MissionStatus, RunTiming},
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Mocks are keyed by normalized URL so tests can script either spelling.
fn key(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|| url.trim().to_string())
}

/// A mock fetcher with scripted per-URL responses.
///
/// Each URL holds a queue of outcomes. Every call pops the front of the
/// queue, except the last outcome, which repeats forever. URLs with no
/// script fail with a permanent "not found" error.
#[derive(Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, VecDeque<StageResult<RawContent>>>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    capability: FetchCapability,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve an HTML page for a URL.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let raw = RawContent::new(url.clone(), body).with_content_type("text/html");
        self.with_response(url, Ok(raw))
    }

    /// Append one outcome to a URL's script.
    pub fn with_response(self, url: impl Into<String>, response: StageResult<RawContent>) -> Self {
        write(&self.responses)
            .entry(key(&url.into()))
            .or_default()
            .push_back(response);
        self
    }

    /// Append several failures to a URL's script, in order.
    pub fn with_errors(self, url: impl Into<String>, errors: impl IntoIterator<Item = StageError>) -> Self {
        let url = url.into();
        errors
            .into_iter()
            .fold(self, |mock, error| mock.with_response(url.clone(), Err(error)))
    }

    /// Sleep before answering for this URL.
    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        write(&self.delays).insert(key(&url.into()), delay);
        self
    }

    pub fn with_capability(mut self, capability: FetchCapability) -> Self {
        self.capability = capability;
        self
    }

    /// Every URL fetched, exactly as the fetcher received it, in call order.
    pub fn calls(&self) -> Vec<String> {
        read(&self.calls).clone()
    }

    /// How many times this URL was fetched, under any spelling.
    pub fn call_count(&self, url: &str) -> usize {
        let url = key(url);
        read(&self.calls).iter().filter(|c| key(c) == url).count()
    }

    fn next_response(&self, url: &str) -> StageResult<RawContent> {
        let mut responses = write(&self.responses);
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(StageError::permanent("script exhausted"))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(StageError::permanent("script exhausted"))),
            None => Err(StageError::permanent(format!("404 Not Found: {url}"))),
        }
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> StageResult<RawContent> {
        write(&self.calls).push(url.to_string());
        let url = key(url);

        let delay = read(&self.delays).get(&url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response(&url)
    }

    fn capability(&self) -> FetchCapability {
        self.capability
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock extractor that passes the body through as text.
///
/// Blank bodies fail as malformed content, like a real extractor would.
/// Specific URLs can be scripted to fail.
#[derive(Default)]
pub struct MockExtractor {
    failures: Arc<RwLock<HashMap<String, VecDeque<StageError>>>>,
    titles: Arc<RwLock<HashMap<String, String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next extraction of this URL. Queue several for repeated failures.
    pub fn with_failure(self, url: impl Into<String>, error: StageError) -> Self {
        write(&self.failures)
            .entry(key(&url.into()))
            .or_default()
            .push_back(error);
        self
    }

    pub fn with_title(self, url: impl Into<String>, title: impl Into<String>) -> Self {
        write(&self.titles).insert(key(&url.into()), title.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        read(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        let url = key(url);
        read(&self.calls).iter().filter(|c| **c == url).count()
    }
}

#[async_trait]
impl ContentExtractor for MockExtractor {
    async fn extract(&self, raw: &RawContent) -> StageResult<ExtractedText> {
        let url = key(&raw.url);
        write(&self.calls).push(url.clone());

        if let Some(error) = write(&self.failures).get_mut(&url).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        if !raw.has_content() {
            return Err(StageError::malformed("empty body"));
        }

        let mut text = ExtractedText::new(raw.body.trim());
        if let Some(title) = read(&self.titles).get(&url) {
            text = text.with_title(title.clone());
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock scorer with fixed per-URL scores.
pub struct MockScorer {
    scores: Arc<RwLock<HashMap<String, f64>>>,
    content_errors: Arc<RwLock<Vec<String>>>,
    default_score: f64,
    misconfigured: bool,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self {
            scores: Arc::default(),
            content_errors: Arc::default(),
            default_score: 0.8,
            misconfigured: false,
            calls: Arc::default(),
        }
    }
}

impl MockScorer {
    /// Scores every source 0.8 unless told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(self, url: impl Into<String>, score: f64) -> Self {
        write(&self.scores).insert(key(&url.into()), score);
        self
    }

    pub fn with_default_score(mut self, score: f64) -> Self {
        self.default_score = score;
        self
    }

    /// Report this URL's text as unscorable.
    pub fn with_content_error(self, url: impl Into<String>) -> Self {
        write(&self.content_errors).push(key(&url.into()));
        self
    }

    /// Fail every call with a configuration error.
    pub fn misconfigured(mut self) -> Self {
        self.misconfigured = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        read(&self.calls).clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        let url = key(url);
        read(&self.calls).iter().filter(|c| **c == url).count()
    }
}

impl QualityScorer for MockScorer {
    fn score(&self, _text: &ExtractedText, metadata: &SourceMetadata<'_>) -> Result<f64, ScoreError> {
        let url = key(metadata.url);
        write(&self.calls).push(url.clone());

        if self.misconfigured {
            return Err(ScoreError::configuration("mock scorer misconfigured"));
        }
        if read(&self.content_errors).contains(&url) {
            return Err(ScoreError::content("mock content error"));
        }
        Ok(read(&self.scores).get(&url).copied().unwrap_or(self.default_score))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Record of a call made to the mock summarizer.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSummarizerCall {
    pub topic: String,
    pub urls: Vec<String>,
    pub style: SummaryStyle,
}

/// A mock summarizer that either echoes its inputs or always fails.
#[derive(Default)]
pub struct MockSummarizer {
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<MockSummarizerCall>>>,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<MockSummarizerCall> {
        read(&self.calls).clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        topic: &str,
        sources: &[ScoredSource<'_>],
        style: SummaryStyle,
    ) -> Result<String, SummarizeError> {
        write(&self.calls).push(MockSummarizerCall {
            topic: topic.to_string(),
            urls: sources.iter().map(|s| s.url.to_string()).collect(),
            style,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(SummarizeError::unavailable(reason.clone()));
        }
        Ok(format!("{style} summary of {topic} from {} sources", sources.len()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A sink and logger that can be told to fail or stall. Succeeds by default.
///
/// Counts calls even when failing, so tests can check that persistence was
/// attempted.
#[derive(Default)]
pub struct FailingSink {
    fail_results: bool,
    fail_logs: bool,
    log_delay: Option<Duration>,
    result_calls: AtomicUsize,
    log_calls: AtomicUsize,
}

impl FailingSink {
    /// A sink that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_results(mut self) -> Self {
        self.fail_results = true;
        self
    }

    pub fn failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    /// Make `log_run` sleep before answering.
    pub fn stalling_logs(mut self, delay: Duration) -> Self {
        self.log_delay = Some(delay);
        self
    }

    pub fn result_calls(&self) -> usize {
        self.result_calls.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultSink for FailingSink {
    async fn persist_result(&self, _result: &MissionResult) -> StorageResult<()> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_results {
            return Err(StorageError::Backend("result store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MissionLogger for FailingSink {
    async fn log_run(&self, _result: &MissionResult, _timing: &RunTiming) -> StorageResult<()> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.log_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_logs {
            return Err(StorageError::Backend("run log unavailable".into()));
        }
        Ok(())
    }
}

/// An observer that remembers everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    transitions: RwLock<Vec<(MissionState, MissionState)>>,
    finished: RwLock<Vec<SourceAttempt>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<MissionState> {
        read(&self.transitions).iter().map(|(_, to)| *to).collect()
    }

    pub fn transitions(&self) -> Vec<(MissionState, MissionState)> {
        read(&self.transitions).clone()
    }

    /// Attempts in the order they reached a terminal stage.
    pub fn finished(&self) -> Vec<SourceAttempt> {
        read(&self.finished).clone()
    }
}

impl MissionObserver for RecordingObserver {
    fn on_transition(&self, _mission_id: &MissionId, from: MissionState, to: MissionState) {
        write(&self.transitions).push((from, to));
    }

    fn on_attempt_finished(&self, _mission_id: &MissionId, attempt: &SourceAttempt) {
        write(&self.finished).push(attempt.clone());
    }
}

/// A small, fully populated result for storage tests.
pub fn sample_result(status: MissionStatus) -> MissionResult {
    let now = Utc::now();
    let mut attempt = SourceAttempt::new(0, "https://example.com/wildfire", "https://example.com/wildfire");
    attempt.fetch_attempts = 1;
    attempt.extract_attempts = 1;
    attempt.text = Some(ExtractedText::new("Satellites now spot wildfires within minutes."));
    attempt.score = Some(0.8);
    attempt.stage = AttemptStage::Succeeded;

    MissionResult {
        mission_id: MissionId::generate(),
        topic: "wildfire detection".to_string(),
        summary_style: SummaryStyle::Technical,
        fetcher_capability: FetchCapability::Direct,
        successful: vec![attempt],
        excluded: Vec::new(),
        summary: Some("# wildfire detection".to_string()),
        summary_error: None,
        status,
        started_at: now,
        harvest_finished_at: now,
        completed_at: now,
    }
}

pub fn sample_timing() -> RunTiming {
    let now = Utc::now();
    RunTiming {
        started_at: now,
        finished_at: now,
        harvest: Duration::from_millis(120),
        summarize: Duration::from_millis(15),
        total: Duration::from_millis(140),
        transitions: vec![StateTransition {
            from: MissionState::Planning,
            to: MissionState::Harvesting,
            at: now,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_script_repeats_last_outcome() {
        let fetcher = MockFetcher::new()
            .with_errors("https://a.org/x", [StageError::temporary("503")])
            .with_page("https://a.org/x", "<p>ok</p>");

        assert!(fetcher.fetch("https://a.org/x").await.is_err());
        assert!(fetcher.fetch("https://a.org/x").await.is_ok());
        assert!(fetcher.fetch("https://A.org/x#top").await.is_ok());
        assert_eq!(fetcher.call_count("https://a.org/x"), 3);
        assert_eq!(fetcher.calls().last().map(String::as_str), Some("https://A.org/x#top"));
    }

    #[tokio::test]
    async fn test_unscripted_url_is_permanent_failure() {
        let err = MockFetcher::new().fetch("https://nowhere.org/").await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_mock_extractor_rejects_blank_body() {
        let err = MockExtractor::new()
            .extract(&RawContent::new("https://a.org/", "   "))
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::StageErrorKind::MalformedContent);
    }
}
