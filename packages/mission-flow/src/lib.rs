//! Research Mission Flow Controller
//!
//! Drives a research mission from a topic and a list of candidate URLs to a
//! scored, summarized result:
//!
//! ```text
//! plan → fetch → extract → score → summarize → persist
//! ```
//!
//! # Design Philosophy
//!
//! - One source failing never fails the mission
//! - Every candidate ends up in exactly one bucket: successful or excluded
//! - Collaborators are traits; the controller owns the sequencing
//! - Bounded everything: retries, concurrency, wall-clock time
//!
//! # Usage
//!
//! ```rust,ignore
//! use mission_flow::{MissionController, MissionRequest, SummaryStyle};
//! use mission_flow::{ExtractiveSummarizer, HeuristicScorer, HtmlExtractor, HttpFetcher, MemorySink, WebFetcher};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let controller = MissionController::new(
//!     WebFetcher::direct(HttpFetcher::new()),
//!     HtmlExtractor,
//!     HeuristicScorer::new(),
//!     ExtractiveSummarizer::new(),
//!     sink.clone(),
//!     sink,
//! );
//!
//! let request = MissionRequest::new("wildfire detection AI")
//!     .with_urls(["https://example.org/a", "https://example.org/b"])
//!     .with_max_sources(2)
//!     .with_style(SummaryStyle::Executive);
//!
//! let run = controller.run(request).await?;
//! println!("{}: {:?}", run.result.status, run.result.summary);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator traits (fetcher, extractor, scorer, summarizer, sinks)
//! - [`types`] - Requests, attempts, results and configuration
//! - [`pipeline`] - Lifecycle, planning, retry, aggregation and the controller
//! - [`fetchers`] - HTTP, link-following and rate-limited fetchers
//! - [`extractors`] - HTML to text
//! - [`scoring`] - Heuristic quality scorer
//! - [`summarizers`] - Extractive summarizer
//! - [`stores`] - Result sinks and run logs
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod pipeline;
pub mod scoring;
pub mod stores;
pub mod summarizers;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    MissionError, ScoreError, ScoreErrorKind, StageError, StageErrorKind, StorageError,
    SummarizeError,
};
pub use traits::{
    extractor::ContentExtractor,
    fetcher::{FetchCapability, SourceFetcher},
    observer::{MissionObserver, NoopObserver},
    scorer::{QualityScorer, SourceMetadata},
    sink::{MissionLogger, ResultSink},
    summarizer::{ScoredSource, Summarizer},
};
pub use types::{
    attempt::{AttemptError, AttemptStage, FailureKind, SourceAttempt},
    config::MissionConfig,
    content::{ExtractedText, RawContent},
    request::{MissionRequest, SummaryStyle},
    result::{
        ExcludedAttempt, ExclusionReason, MissionId, MissionResult, MissionRun, MissionStatus,
        PersistenceReport, RunTiming,
    },
};

// Re-export pipeline components
pub use pipeline::{
    aggregate, determine_status, normalize_url, plan_candidates, Aggregation, Lifecycle,
    MissionController, MissionPlan, MissionState, PlannedCandidate, RetryPolicy, StateTransition,
    LOG_RUN_TIMEOUT,
};

// Re-export implementations
pub use extractors::HtmlExtractor;
pub use fetchers::{FetcherExt, HttpFetcher, LinkFollowingFetcher, RateLimitedFetcher, WebFetcher};
pub use scoring::{HeuristicScorer, ScoreWeights};
pub use stores::{DomainStats, JsonFileSink, JsonlRunLog, LoggedSource, MemorySink, RunLogEntry, RunStats};
pub use summarizers::ExtractiveSummarizer;

// Re-export testing utilities
pub use testing::{FailingSink, MockExtractor, MockFetcher, MockScorer, MockSummarizer, RecordingObserver};
