//! Storage implementations for mission output.
//!
//! Available backends:
//! - `MemorySink` - in-memory results and run log (both traits)
//! - `JsonFileSink` - one pretty JSON file per mission (`ResultSink`)
//! - `JsonlRunLog` - append-only JSON lines run log (`MissionLogger`)
//!
//! `RunStats` summarizes a run log across missions.

pub mod json_file;
pub mod memory;
pub mod stats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use json_file::{JsonFileSink, JsonlRunLog};
pub use memory::MemorySink;
pub use stats::{DomainStats, RunStats};

use url::Url;

use crate::pipeline::lifecycle::StateTransition;
use crate::types::attempt::SourceAttempt;
use crate::types::result::{MissionId, MissionResult, MissionStatus, RunTiming};

/// One run log record: enough to audit a mission without the full result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub mission_id: MissionId,
    pub topic: String,
    pub status: MissionStatus,
    pub attempted: usize,
    pub successful: usize,
    pub excluded: usize,
    pub summarized: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub harvest_ms: u64,
    pub summarize_ms: u64,
    pub total_ms: u64,
    pub transitions: Vec<StateTransition>,
    /// Every attempted source; older log lines have none
    #[serde(default)]
    pub sources: Vec<LoggedSource>,
}

/// Per-source line in a run log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSource {
    pub url: String,
    /// Host without a leading `www.`, or "unknown" for unparseable URLs
    pub domain: String,
    pub score: Option<f64>,
    pub kept: bool,
}

impl LoggedSource {
    fn new(attempt: &SourceAttempt, kept: bool) -> Self {
        Self {
            url: attempt.url.clone(),
            domain: domain_of(&attempt.normalized_url),
            score: attempt.score,
            kept,
        }
    }
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

impl RunLogEntry {
    pub fn new(result: &MissionResult, timing: &RunTiming) -> Self {
        Self {
            mission_id: result.mission_id.clone(),
            topic: result.topic.clone(),
            status: result.status,
            attempted: result.total_attempted(),
            successful: result.successful.len(),
            excluded: result.excluded.len(),
            summarized: result.summary.is_some(),
            started_at: timing.started_at,
            finished_at: timing.finished_at,
            harvest_ms: timing.harvest.as_millis() as u64,
            summarize_ms: timing.summarize.as_millis() as u64,
            total_ms: timing.total.as_millis() as u64,
            transitions: timing.transitions.clone(),
            sources: result
                .successful
                .iter()
                .map(|a| LoggedSource::new(a, true))
                .chain(result.excluded.iter().map(|e| LoggedSource::new(&e.attempt, false)))
                .collect(),
        }
    }
}
