//! Source attempts - one candidate URL's journey through fetch, extract, score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StageError, StageErrorKind};
use crate::types::content::ExtractedText;

/// Where an attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStage {
    Pending,
    Fetching,
    Extracting,
    Scoring,
    Succeeded,
    Failed,
}

impl AttemptStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStage::Succeeded | AttemptStage::Failed)
    }
}

/// Why an attempt ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkTimeout,
    TemporaryServerError,
    PermanentError,
    MalformedContent,
    /// The mission timeout fired before the attempt finished.
    Timeout,
    /// The candidate was not a fetchable http(s) URL.
    InvalidUrl,
}

impl From<StageErrorKind> for FailureKind {
    fn from(kind: StageErrorKind) -> Self {
        match kind {
            StageErrorKind::NetworkTimeout => FailureKind::NetworkTimeout,
            StageErrorKind::TemporaryServerError => FailureKind::TemporaryServerError,
            StageErrorKind::PermanentError => FailureKind::PermanentError,
            StageErrorKind::MalformedContent => FailureKind::MalformedContent,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::NetworkTimeout => "network timeout",
            FailureKind::TemporaryServerError => "temporary server error",
            FailureKind::PermanentError => "permanent error",
            FailureKind::MalformedContent => "malformed content",
            FailureKind::Timeout => "mission timeout",
            FailureKind::InvalidUrl => "invalid url",
        };
        f.write_str(s)
    }
}

/// The last error an attempt saw, kept for diagnosis without log access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptError {
    pub kind: FailureKind,
    /// Stage the error happened in
    pub stage: AttemptStage,
    pub message: String,
}

/// Per-source record of fetch/extract/score progress and outcome.
///
/// Created by the controller when a URL is scheduled, then moved into the
/// worker that drives it. Only that worker mutates it; the controller gets it
/// back once it is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttempt {
    /// URL as given in the request
    pub url: String,

    /// Normalized URL, used only as the dedup key
    pub normalized_url: String,

    /// Index in the planned candidate ordering
    pub position: usize,

    /// Number of fetch calls made
    pub fetch_attempts: u32,

    /// Number of extract calls made
    pub extract_attempts: u32,

    pub stage: AttemptStage,

    pub last_error: Option<AttemptError>,

    /// Extracted text; the last successful extraction wins
    pub text: Option<ExtractedText>,

    /// Quality score, set once scoring ran
    pub score: Option<f64>,

    /// Scorer message when scoring failed and the score defaulted to 0
    pub score_error: Option<String>,
}

impl SourceAttempt {
    pub fn new(position: usize, url: impl Into<String>, normalized_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            normalized_url: normalized_url.into(),
            position,
            fetch_attempts: 0,
            extract_attempts: 0,
            stage: AttemptStage::Pending,
            last_error: None,
            text: None,
            score: None,
            score_error: None,
        }
    }

    /// Total stage invocations across fetch and extract.
    pub fn attempt_count(&self) -> u32 {
        self.fetch_attempts + self.extract_attempts
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.stage {
            AttemptStage::Failed => self.last_error.as_ref().map(|e| e.kind),
            _ => None,
        }
    }

    /// Record a stage error without changing the stage.
    pub(crate) fn record_error(&mut self, error: &StageError) {
        self.last_error = Some(AttemptError {
            kind: error.kind.into(),
            stage: self.stage,
            message: error.message.clone(),
        });
    }

    /// Mark the attempt failed.
    pub(crate) fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        self.last_error = Some(AttemptError {
            kind,
            stage: self.stage,
            message: message.into(),
        });
        self.stage = AttemptStage::Failed;
    }

    /// Mark the attempt failed with whatever error it last recorded.
    pub(crate) fn fail_with_last_error(&mut self) {
        self.stage = AttemptStage::Failed;
    }

    pub(crate) fn succeed(&mut self, score: f64) {
        self.score = Some(score);
        self.stage = AttemptStage::Succeeded;
    }
}
