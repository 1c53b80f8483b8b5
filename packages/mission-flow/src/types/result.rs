//! Mission result types - the single value a mission produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::pipeline::lifecycle::StateTransition;
use crate::traits::fetcher::FetchCapability;
use crate::types::attempt::{FailureKind, SourceAttempt};
use crate::types::request::SummaryStyle;

/// Unique identifier for one mission run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(String);

impl MissionId {
    /// Generate a fresh id of the form `mission_<12 hex chars>`.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("mission_{}", &hex[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Overall outcome of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    /// Every attempted source passed and the summary was produced.
    Complete,
    /// Usable but incomplete: some sources dropped, or summarization degraded.
    Partial,
    /// No source made it into the successful set.
    Failed,
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissionStatus::Complete => "COMPLETE",
            MissionStatus::Partial => "PARTIAL",
            MissionStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Why a terminal attempt did not make it into `successful`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The attempt failed at some stage.
    Failed { kind: FailureKind },
    /// The attempt succeeded but scored below the quality bar.
    BelowThreshold { score: f64, threshold: f64 },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::Failed { kind } => write!(f, "failed: {kind}"),
            ExclusionReason::BelowThreshold { score, threshold } => {
                write!(f, "score {score:.2} below threshold {threshold:.2}")
            }
        }
    }
}

/// A terminal attempt that was left out of the summary, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedAttempt {
    pub attempt: SourceAttempt,
    pub reason: ExclusionReason,
}

/// Final mission output. Built once at the end of the run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionResult {
    pub mission_id: MissionId,

    pub topic: String,

    pub summary_style: SummaryStyle,

    /// Capability of the fetcher the controller was built with
    pub fetcher_capability: FetchCapability,

    /// Succeeded attempts at or above the threshold, in candidate order
    pub successful: Vec<SourceAttempt>,

    /// Failed and below-threshold attempts, in candidate order
    pub excluded: Vec<ExcludedAttempt>,

    /// Digest text; None when summarization failed or was skipped
    pub summary: Option<String>,

    /// Summarizer error when the mission degraded
    pub summary_error: Option<String>,

    pub status: MissionStatus,

    pub started_at: DateTime<Utc>,

    pub harvest_finished_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,
}

impl MissionResult {
    /// Number of candidates that were attempted.
    pub fn total_attempted(&self) -> usize {
        self.successful.len() + self.excluded.len()
    }

    /// Attempts that failed (as opposed to scoring too low).
    pub fn failed(&self) -> impl Iterator<Item = &ExcludedAttempt> {
        self.excluded
            .iter()
            .filter(|e| matches!(e.reason, ExclusionReason::Failed { .. }))
    }

    /// Look up an attempt by its request URL in either list.
    pub fn attempt_for(&self, url: &str) -> Option<&SourceAttempt> {
        self.successful
            .iter()
            .find(|a| a.url == url)
            .or_else(|| self.excluded.iter().map(|e| &e.attempt).find(|a| a.url == url))
    }

    pub fn successful_urls(&self) -> Vec<&str> {
        self.successful.iter().map(|a| a.url.as_str()).collect()
    }

    pub fn excluded_urls(&self) -> Vec<&str> {
        self.excluded.iter().map(|e| e.attempt.url.as_str()).collect()
    }
}

/// Timing metadata handed to the `MissionLogger`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTiming {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub harvest: Duration,
    #[serde(with = "duration_ms")]
    pub summarize: Duration,
    #[serde(with = "duration_ms")]
    pub total: Duration,
    /// Lifecycle transitions up to and including PERSISTING
    pub transitions: Vec<StateTransition>,
}

/// Outcome of the persistence stage. Never affects `MissionStatus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceReport {
    /// `ResultSink` failure, if any
    pub result_error: Option<String>,
    /// `MissionLogger` failure, if any
    pub log_error: Option<String>,
}

impl PersistenceReport {
    /// The persistence-error flag surfaced to callers.
    pub fn has_errors(&self) -> bool {
        self.result_error.is_some() || self.log_error.is_some()
    }
}

/// What `MissionController::run` returns for any mission that was not aborted.
#[derive(Debug, Clone)]
pub struct MissionRun {
    pub result: MissionResult,
    pub persistence: PersistenceReport,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
