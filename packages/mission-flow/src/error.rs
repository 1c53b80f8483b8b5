//! Typed errors for the mission flow library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the exact failure instead of parsing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::lifecycle::MissionState;

/// Errors that abort a mission outright.
///
/// Per-source failures never surface here; they are contained in the
/// mission's `SourceAttempt` records. Only a mission that cannot start, or
/// that hits a programming/configuration fault, fails the call itself.
#[derive(Debug, Error)]
pub enum MissionError {
    /// The request failed validation; the mission never started.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The controller configuration is unusable.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Catastrophic failure (scorer misconfiguration, illegal transition).
    #[error("mission aborted during {state}: {reason}")]
    Fatal { state: MissionState, reason: String },

    /// The caller cancelled the mission.
    #[error("mission cancelled during {state}")]
    Cancelled { state: MissionState },
}

impl MissionError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn fatal(state: MissionState, reason: impl Into<String>) -> Self {
        Self::Fatal {
            state,
            reason: reason.into(),
        }
    }
}

/// Classification of a fetch or extract failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    /// The remote did not answer in time, or the connection dropped.
    NetworkTimeout,
    /// 5xx, 429 and friends: worth asking again.
    TemporaryServerError,
    /// 404, refused content type, anything that will not change on retry.
    PermanentError,
    /// The content could not be turned into text.
    MalformedContent,
}

impl StageErrorKind {
    /// Whether a stage failing with this kind should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StageErrorKind::NetworkTimeout | StageErrorKind::TemporaryServerError
        )
    }
}

/// A failure reported by a `SourceFetcher` or `ContentExtractor`.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct StageError {
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network_timeout(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::NetworkTimeout, message)
    }

    pub fn temporary(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::TemporaryServerError, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::PermanentError, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::MalformedContent, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// How serious a scoring failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreErrorKind {
    /// The text could not be scored; the source counts as score 0.
    Content,
    /// The scorer itself is misconfigured; the mission must abort.
    Configuration,
}

/// A failure reported by a `QualityScorer`.
#[derive(Debug, Clone, Error)]
#[error("scoring failed ({kind:?}): {message}")]
pub struct ScoreError {
    pub kind: ScoreErrorKind,
    pub message: String,
}

impl ScoreError {
    pub fn content(message: impl Into<String>) -> Self {
        Self {
            kind: ScoreErrorKind::Content,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: ScoreErrorKind::Configuration,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ScoreErrorKind::Configuration
    }
}

/// Errors from a `Summarizer`.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The summarizer could not produce a digest.
    #[error("summarizer unavailable: {reason}")]
    Unavailable { reason: String },
}

impl SummarizeError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Errors from a `ResultSink` or `MissionLogger`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or backend write failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The write did not finish within its budget.
    #[error("storage write timed out")]
    TimedOut,
}

/// Result type alias for mission operations.
pub type Result<T> = std::result::Result<T, MissionError>;

/// Result type alias for fetch/extract stages.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Result type alias for persistence operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
