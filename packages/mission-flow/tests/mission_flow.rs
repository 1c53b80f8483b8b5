//! Integration tests for the mission controller.
//!
//! These drive full missions through mocked collaborators:
//! 1. Plan (dedup, truncate)
//! 2. Harvest (retry, timeout, cancellation)
//! 3. Aggregate and summarize
//! 4. Persist

use std::sync::Arc;
use std::time::Duration;

use mission_flow::{
    testing::{FailingSink, MockExtractor, MockFetcher, MockScorer, MockSummarizer, RecordingObserver},
    ExclusionReason, FailureKind, FetchCapability, MemorySink, MissionConfig, MissionController,
    MissionError, MissionRequest, MissionState, MissionStatus, StageError, SummaryStyle,
};
use tokio_util::sync::CancellationToken;

const BODY: &str = "Satellite systems now flag new wildfires within minutes of ignition.";

/// Handles to every mock so tests can inspect calls after the run.
struct Harness {
    fetcher: Arc<MockFetcher>,
    extractor: Arc<MockExtractor>,
    scorer: Arc<MockScorer>,
    summarizer: Arc<MockSummarizer>,
    sink: Arc<MemorySink>,
    observer: Arc<RecordingObserver>,
}

impl Harness {
    fn new(fetcher: MockFetcher, scorer: MockScorer) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(MockExtractor::new()),
            scorer: Arc::new(scorer),
            summarizer: Arc::new(MockSummarizer::new()),
            sink: Arc::new(MemorySink::new()),
            observer: Arc::new(RecordingObserver::new()),
        }
    }

    fn with_extractor(mut self, extractor: MockExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    fn with_summarizer(mut self, summarizer: MockSummarizer) -> Self {
        self.summarizer = Arc::new(summarizer);
        self
    }

    fn controller(&self) -> MissionController {
        MissionController::new(
            self.fetcher.clone(),
            self.extractor.clone(),
            self.scorer.clone(),
            self.summarizer.clone(),
            self.sink.clone(),
            self.sink.clone(),
        )
        .with_config(fast_config())
        .with_observer(self.observer.clone())
    }
}

fn fast_config() -> MissionConfig {
    MissionConfig::new()
        .with_backoff(Duration::from_millis(10), Duration::from_millis(100))
        .with_mission_timeout(Duration::from_secs(10))
}

fn pages(urls: &[&str]) -> MockFetcher {
    urls.iter().fold(MockFetcher::new(), |f, url| f.with_page(*url, BODY))
}

fn request(urls: &[&str]) -> MissionRequest {
    MissionRequest::new("wildfire detection AI")
        .with_urls(urls.iter().copied())
        .with_max_sources(urls.len().max(1))
        .with_quality_threshold(0.5)
}

#[tokio::test(start_paused = true)]
async fn test_all_sources_pass_is_complete() {
    let urls = ["https://a.org/fire", "https://b.org/fire", "https://c.org/fire"];
    let h = Harness::new(pages(&urls), MockScorer::new());

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(run.result.status, MissionStatus::Complete);
    assert_eq!(run.result.successful_urls(), urls.to_vec());
    assert!(run.result.excluded.is_empty());
    assert_eq!(
        run.result.summary.as_deref(),
        Some("technical summary of wildfire detection AI from 3 sources")
    );
    assert_eq!(run.result.fetcher_capability, FetchCapability::Direct);
    assert!(!run.persistence.has_errors());
}

#[tokio::test]
async fn test_empty_candidates_rejected_before_any_work() {
    let h = Harness::new(MockFetcher::new(), MockScorer::new());

    let err = h
        .controller()
        .run(MissionRequest::new("wildfire detection AI"))
        .await
        .unwrap_err();

    assert!(matches!(err, MissionError::InvalidRequest { .. }));
    assert!(h.fetcher.calls().is_empty());
    assert_eq!(h.sink.result_count(), 0);
    assert_eq!(h.observer.states(), vec![MissionState::Planning, MissionState::Aborted]);
}

#[tokio::test]
async fn test_invalid_config_aborts() {
    let urls = ["https://a.org/fire"];
    let h = Harness::new(pages(&urls), MockScorer::new());

    let err = h
        .controller()
        .with_config(MissionConfig::new().with_concurrency(0))
        .run(request(&urls))
        .await
        .unwrap_err();

    assert!(matches!(err, MissionError::Configuration { .. }));
    assert!(h.fetcher.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_collapse_and_max_sources_bounds_attempts() {
    let a = "https://news.example/wildfire-ai";
    let a_dup = "https://NEWS.example/wildfire-ai#comments";
    let b = "https://science.example/smoke";
    let c = "https://blog.example/fires";

    let fetcher = pages(&[a, b, c]);
    let scorer = MockScorer::new().with_score(a, 0.7).with_score(b, 0.3);
    let h = Harness::new(fetcher, scorer);

    let req = MissionRequest::new("wildfire detection AI")
        .with_urls([a, a_dup, b, c])
        .with_max_sources(2)
        .with_quality_threshold(0.5);
    let run = h.controller().run(req).await.unwrap();
    let result = &run.result;

    assert_eq!(result.successful_urls(), vec![a]);
    assert_eq!(result.excluded_urls(), vec![b]);
    assert_eq!(result.total_attempted(), 2);
    assert!(matches!(
        result.excluded[0].reason,
        ExclusionReason::BelowThreshold { score, threshold } if score == 0.3 && threshold == 0.5
    ));
    assert_eq!(result.status, MissionStatus::Partial);
    assert!(result.summary.is_some());

    // The duplicate and the candidate past max_sources were never touched
    assert_eq!(h.fetcher.call_count(a), 1);
    assert_eq!(h.fetcher.call_count(c), 0);
    assert_eq!(h.summarizer.calls()[0].urls, vec![a.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_score_equal_to_threshold_passes() {
    let urls = ["https://a.org/fire", "https://b.org/fire"];
    let scorer = MockScorer::new()
        .with_score(urls[0], 0.5)
        .with_score(urls[1], 0.4999);
    let h = Harness::new(pages(&urls), scorer);

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(run.result.successful_urls(), vec![urls[0]]);
    assert_eq!(run.result.excluded_urls(), vec![urls[1]]);
}

#[tokio::test(start_paused = true)]
async fn test_transient_fetch_errors_stop_at_retry_limit() {
    let flaky = "https://flaky.org/fire";
    let fetcher = MockFetcher::new().with_errors(flaky, [StageError::temporary("503 Service Unavailable")]);
    let h = Harness::new(fetcher, MockScorer::new());

    let run = h.controller().run(request(&[flaky])).await.unwrap();

    assert_eq!(h.fetcher.call_count(flaky), 3);
    let attempt = run.result.attempt_for(flaky).unwrap();
    assert_eq!(attempt.fetch_attempts, 3);
    assert_eq!(attempt.extract_attempts, 0);
    assert_eq!(attempt.failure_kind(), Some(FailureKind::TemporaryServerError));
    assert_eq!(run.result.status, MissionStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_error() {
    let url = "https://slow.org/fire";
    let fetcher = MockFetcher::new()
        .with_errors(url, [StageError::network_timeout("connect timed out")])
        .with_page(url, BODY);
    let h = Harness::new(fetcher, MockScorer::new());

    let run = h.controller().run(request(&[url])).await.unwrap();

    assert_eq!(run.result.successful_urls(), vec![url]);
    assert_eq!(run.result.successful[0].fetch_attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_errors_are_not_retried() {
    let gone = "https://gone.org/fire";
    let ok = "https://ok.org/fire";
    let fetcher = MockFetcher::new()
        .with_errors(gone, [StageError::permanent("404 Not Found")])
        .with_page(ok, BODY);
    let h = Harness::new(fetcher, MockScorer::new());

    let run = h.controller().run(request(&[gone, ok])).await.unwrap();

    assert_eq!(h.fetcher.call_count(gone), 1);
    assert_eq!(
        run.result.attempt_for(gone).unwrap().failure_kind(),
        Some(FailureKind::PermanentError)
    );
    assert_eq!(run.result.status, MissionStatus::Partial);
}

#[tokio::test(start_paused = true)]
async fn test_extract_failures_retry_like_fetch_failures() {
    let url = "https://a.org/fire";
    let broken = "https://b.org/fire";
    let extractor = MockExtractor::new()
        .with_failure(url, StageError::network_timeout("renderer busy"))
        .with_failure(broken, StageError::malformed("binary content"));
    let h = Harness::new(pages(&[url, broken]), MockScorer::new()).with_extractor(extractor);

    let run = h.controller().run(request(&[url, broken])).await.unwrap();

    assert_eq!(run.result.attempt_for(url).unwrap().extract_attempts, 2);
    assert_eq!(h.extractor.call_count(broken), 1);
    assert_eq!(
        run.result.attempt_for(broken).unwrap().failure_kind(),
        Some(FailureKind::MalformedContent)
    );
}

#[tokio::test(start_paused = true)]
async fn test_all_fetches_failing_is_failed_without_summary() {
    let urls = ["https://a.org/x", "https://b.org/y"];
    let fetcher = urls.iter().fold(MockFetcher::new(), |f, url| {
        f.with_errors(*url, [StageError::permanent("403 Forbidden")])
    });
    let h = Harness::new(fetcher, MockScorer::new());

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(run.result.status, MissionStatus::Failed);
    assert!(run.result.successful.is_empty());
    assert_eq!(run.result.failed().count(), 2);
    assert!(run.result.summary.is_none());
    assert!(h.summarizer.calls().is_empty());
    assert!(h.scorer.calls().is_empty());

    // Persistence still happens for FAILED missions
    assert_eq!(h.sink.result(&run.result.mission_id), Some(run.result.clone()));
    assert_eq!(h.sink.runs().len(), 1);
    assert!(!h.observer.states().contains(&MissionState::Summarizing));
}

#[tokio::test(start_paused = true)]
async fn test_mission_timeout_marks_pending_attempts() {
    let fast = ["https://a.org/1", "https://b.org/2", "https://c.org/3"];
    let slow = ["https://d.org/4", "https://e.org/5"];
    let fetcher = slow.iter().fold(pages(&fast), |f, url| {
        f.with_page(*url, BODY).with_delay(*url, Duration::from_secs(60))
    });
    let h = Harness::new(fetcher, MockScorer::new());

    let all: Vec<&str> = fast.iter().chain(slow.iter()).copied().collect();
    let controller = h.controller().with_config(
        fast_config()
            .with_concurrency(5)
            .with_mission_timeout(Duration::from_secs(10)),
    );
    let started = tokio::time::Instant::now();
    let run = controller.run(request(&all)).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(11));
    assert_eq!(run.result.successful_urls(), fast.to_vec());
    assert_eq!(run.result.excluded_urls(), slow.to_vec());
    for url in slow {
        let attempt = run.result.attempt_for(url).unwrap();
        assert_eq!(attempt.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(attempt.fetch_attempts, 1);
    }
    assert_eq!(run.result.status, MissionStatus::Partial);
    assert!(run.result.summary.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_mission_timeout_fails_candidates_not_yet_started() {
    let stalled = "https://a.org/slow";
    let queued = ["https://b.org/1", "https://c.org/2"];
    let fetcher = pages(&queued)
        .with_page(stalled, BODY)
        .with_delay(stalled, Duration::from_secs(60));
    let h = Harness::new(fetcher, MockScorer::new());

    let all = [stalled, queued[0], queued[1]];
    let controller = h.controller().with_config(
        fast_config()
            .with_concurrency(1)
            .with_mission_timeout(Duration::from_secs(10)),
    );
    let started = tokio::time::Instant::now();
    let run = controller.run(request(&all)).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(11));
    for url in all {
        let attempt = run.result.attempt_for(url).unwrap();
        assert_eq!(attempt.failure_kind(), Some(FailureKind::Timeout), "{url}");
    }
    for url in queued {
        assert_eq!(h.fetcher.call_count(url), 0, "{url} started after the deadline");
    }
    assert!(run.result.successful.is_empty());
    assert_eq!(run.result.status, MissionStatus::Failed);
    assert_eq!(h.observer.finished().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_fetcher_receives_url_as_written() {
    let url = "https://Example.org/docs/report/";
    let h = Harness::new(pages(&[url]), MockScorer::new());

    let run = h.controller().run(request(&[url])).await.unwrap();

    assert_eq!(h.fetcher.calls(), vec![url.to_string()]);
    assert_eq!(h.scorer.calls(), vec!["https://example.org/docs/report".to_string()]);
    let attempt = run.result.attempt_for(url).unwrap();
    assert_eq!(attempt.url, url);
    assert_eq!(attempt.normalized_url, "https://example.org/docs/report");
    assert_eq!(run.result.status, MissionStatus::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_each_extracted_source_scored_exactly_once() {
    let urls = ["https://a.org/1", "https://b.org/2", "https://c.org/3"];
    let h = Harness::new(pages(&urls), MockScorer::new());

    h.controller().run(request(&urls)).await.unwrap();

    for url in urls {
        assert_eq!(h.scorer.call_count(url), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scorer_content_error_scores_zero() {
    let urls = ["https://a.org/1", "https://b.org/2"];
    let scorer = MockScorer::new().with_content_error(urls[1]);
    let h = Harness::new(pages(&urls), scorer);

    let run = h.controller().run(request(&urls)).await.unwrap();

    let excluded = run.result.attempt_for(urls[1]).unwrap();
    assert_eq!(excluded.score, Some(0.0));
    assert!(excluded.score_error.is_some());
    assert_eq!(run.result.status, MissionStatus::Partial);
}

#[tokio::test(start_paused = true)]
async fn test_scorer_configuration_error_aborts_mission() {
    let urls = ["https://a.org/1"];
    let h = Harness::new(pages(&urls), MockScorer::new().misconfigured());

    let err = h.controller().run(request(&urls)).await.unwrap_err();

    assert!(matches!(
        err,
        MissionError::Fatal { state: MissionState::Harvesting, .. }
    ));
    assert_eq!(h.sink.result_count(), 0);
    assert_eq!(h.observer.states().last(), Some(&MissionState::Aborted));
}

#[tokio::test(start_paused = true)]
async fn test_summarizer_failure_degrades_to_partial() {
    let urls = ["https://a.org/1", "https://b.org/2"];
    let h = Harness::new(pages(&urls), MockScorer::new())
        .with_summarizer(MockSummarizer::failing("model overloaded"));

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(run.result.status, MissionStatus::Partial);
    assert!(run.result.summary.is_none());
    assert!(run.result.summary_error.as_deref().unwrap().contains("model overloaded"));
    assert_eq!(run.result.successful.len(), 2);
    assert_eq!(h.summarizer.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_summarizer_receives_style_and_candidate_order() {
    let urls = ["https://c.org/3", "https://a.org/1", "https://b.org/2"];
    let h = Harness::new(pages(&urls), MockScorer::new());

    let req = request(&urls).with_style(SummaryStyle::Casual);
    h.controller().run(req).await.unwrap();

    let calls = h.summarizer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].style, SummaryStyle::Casual);
    assert_eq!(calls[0].urls, urls.iter().map(|u| u.to_string()).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_is_reported_without_changing_status() {
    let urls = ["https://a.org/1"];
    let sink = Arc::new(FailingSink::new().failing_results());
    let controller = MissionController::new(
        pages(&urls),
        MockExtractor::new(),
        MockScorer::new(),
        MockSummarizer::new(),
        sink.clone(),
        sink.clone(),
    )
    .with_config(fast_config());

    let run = controller.run(request(&urls)).await.unwrap();

    assert_eq!(run.result.status, MissionStatus::Complete);
    assert!(run.persistence.has_errors());
    assert!(run.persistence.result_error.is_some());
    assert!(run.persistence.log_error.is_none());
    // The run log is still attempted after the result write fails
    assert_eq!(sink.log_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_run_log_times_out() {
    let urls = ["https://a.org/1"];
    let sink = Arc::new(FailingSink::new().stalling_logs(Duration::from_secs(600)));
    let controller = MissionController::new(
        pages(&urls),
        MockExtractor::new(),
        MockScorer::new(),
        MockSummarizer::new(),
        sink.clone(),
        sink.clone(),
    )
    .with_config(fast_config());

    let run = controller.run(request(&urls)).await.unwrap();

    assert_eq!(run.result.status, MissionStatus::Complete);
    assert_eq!(sink.result_calls(), 1);
    assert!(run.persistence.log_error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_harvest() {
    let url = "https://slow.org/fire";
    let fetcher = pages(&[url]).with_delay(url, Duration::from_secs(30));
    let h = Harness::new(fetcher, MockScorer::new());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = h
        .controller()
        .run_with_cancel(request(&[url]), cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MissionError::Cancelled { state: MissionState::Harvesting }
    ));
    assert_eq!(h.sink.result_count(), 0);
    assert!(h.summarizer.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_summarization() {
    let url = "https://a.org/fire";
    let h = Harness::new(pages(&[url]), MockScorer::new())
        .with_summarizer(MockSummarizer::new().with_delay(Duration::from_secs(30)));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let err = h
        .controller()
        .run_with_cancel(request(&[url]), cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MissionError::Cancelled { state: MissionState::Summarizing }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_observer_sees_full_lifecycle() {
    let urls = ["https://a.org/1", "https://b.org/2"];
    let h = Harness::new(pages(&urls), MockScorer::new());

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(
        h.observer.states(),
        vec![
            MissionState::Planning,
            MissionState::Harvesting,
            MissionState::ScoringDone,
            MissionState::Summarizing,
            MissionState::Persisting,
            MissionState::Done,
        ]
    );
    assert_eq!(h.observer.finished().len(), 2);
    assert!(h.observer.finished().iter().all(|a| a.is_terminal()));

    let logged = &h.sink.runs()[0];
    assert_eq!(logged.mission_id, run.result.mission_id);
    assert_eq!(logged.attempted, 2);
    assert!(logged.summarized);
}

#[tokio::test(start_paused = true)]
async fn test_non_http_candidate_is_excluded_as_invalid() {
    let ok = "https://a.org/1";
    let bad = "ftp://files.example/report.txt";
    let h = Harness::new(pages(&[ok]), MockScorer::new());

    let run = h.controller().run(request(&[ok, bad])).await.unwrap();

    assert_eq!(
        run.result.attempt_for(bad).unwrap().failure_kind(),
        Some(FailureKind::InvalidUrl)
    );
    assert_eq!(h.fetcher.calls(), vec![ok.to_string()]);
    assert_eq!(run.result.status, MissionStatus::Partial);
}

#[tokio::test(start_paused = true)]
async fn test_exploratory_capability_is_recorded() {
    let urls = ["https://a.org/1"];
    let fetcher = pages(&urls).with_capability(FetchCapability::Exploratory);
    let h = Harness::new(fetcher, MockScorer::new());

    let run = h.controller().run(request(&urls)).await.unwrap();

    assert_eq!(run.result.fetcher_capability, FetchCapability::Exploratory);
}
