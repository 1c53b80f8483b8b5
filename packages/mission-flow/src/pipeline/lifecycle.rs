//! Mission lifecycle state machine.
//!
//! ```text
//! CREATED → PLANNING → HARVESTING → SCORING_DONE → SUMMARIZING → PERSISTING → DONE
//!                                        └──────────────────────────┘
//!                                     (skip when no source met the bar)
//! any non-terminal state → ABORTED
//! ```
//!
//! The controller owns exactly one `Lifecycle` per run and is its only
//! writer. Transitions outside the table are programming errors and surface
//! as `MissionError::Fatal`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionState {
    Created,
    Planning,
    Harvesting,
    ScoringDone,
    Summarizing,
    Persisting,
    Done,
    Aborted,
}

impl MissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionState::Done | MissionState::Aborted)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: MissionState) -> bool {
        use MissionState::*;

        if next == Aborted {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Created, Planning)
                | (Planning, Harvesting)
                | (Harvesting, ScoringDone)
                | (ScoringDone, Summarizing)
                | (ScoringDone, Persisting)
                | (Summarizing, Persisting)
                | (Persisting, Done)
        )
    }

    /// Rough progress percentage on entering this state, for observers.
    pub fn progress(&self) -> f32 {
        match self {
            MissionState::Created => 0.0,
            MissionState::Planning => 10.0,
            MissionState::Harvesting => 25.0,
            MissionState::ScoringDone => 60.0,
            MissionState::Summarizing => 75.0,
            MissionState::Persisting => 90.0,
            MissionState::Done | MissionState::Aborted => 100.0,
        }
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissionState::Created => "CREATED",
            MissionState::Planning => "PLANNING",
            MissionState::Harvesting => "HARVESTING",
            MissionState::ScoringDone => "SCORING_DONE",
            MissionState::Summarizing => "SUMMARIZING",
            MissionState::Persisting => "PERSISTING",
            MissionState::Done => "DONE",
            MissionState::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: MissionState,
    pub to: MissionState,
    pub at: DateTime<Utc>,
}

/// Current state plus the history of how it got there.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: MissionState,
    history: Vec<StateTransition>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: MissionState::Created,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Move to `next`, returning the state left behind.
    pub fn advance(&mut self, next: MissionState) -> Result<MissionState, MissionError> {
        let from = self.state;
        if !from.can_transition_to(next) {
            return Err(MissionError::fatal(
                from,
                format!("illegal transition {from} -> {next}"),
            ));
        }
        self.state = next;
        self.history.push(StateTransition {
            from,
            to: next,
            at: Utc::now(),
        });
        Ok(from)
    }

    /// Move to ABORTED. A no-op when already terminal.
    pub fn abort(&mut self) -> MissionState {
        let from = self.state;
        if !from.is_terminal() {
            self.state = MissionState::Aborted;
            self.history.push(StateTransition {
                from,
                to: MissionState::Aborted,
                at: Utc::now(),
            });
        }
        from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MissionState::*;

    #[test]
    fn test_happy_path_is_legal() {
        let mut lifecycle = Lifecycle::new();
        for next in [Planning, Harvesting, ScoringDone, Summarizing, Persisting, Done] {
            lifecycle.advance(next).unwrap();
        }
        assert_eq!(lifecycle.state(), Done);
        assert_eq!(lifecycle.history().len(), 6);
        assert_eq!(lifecycle.history()[0].from, Created);
    }

    #[test]
    fn test_summarization_can_be_skipped() {
        assert!(ScoringDone.can_transition_to(Persisting));
    }

    #[test]
    fn test_stages_cannot_be_skipped_otherwise() {
        assert!(!Created.can_transition_to(Harvesting));
        assert!(!Planning.can_transition_to(ScoringDone));
        assert!(!Harvesting.can_transition_to(Summarizing));
        assert!(!Summarizing.can_transition_to(Done));
        assert!(!Persisting.can_transition_to(Summarizing));
    }

    #[test]
    fn test_illegal_advance_is_fatal() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(Done).unwrap_err();
        assert!(matches!(err, MissionError::Fatal { state: Created, .. }));
        assert_eq!(lifecycle.state(), Created);
    }

    #[test]
    fn test_abort_from_any_non_terminal_state() {
        for state in [Created, Planning, Harvesting, ScoringDone, Summarizing, Persisting] {
            assert!(state.can_transition_to(Aborted), "{state} should abort");
        }
        assert!(!Done.can_transition_to(Aborted));
        assert!(!Aborted.can_transition_to(Aborted));
    }

    #[test]
    fn test_abort_is_idempotent() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Planning).unwrap();
        assert_eq!(lifecycle.abort(), Planning);
        assert_eq!(lifecycle.abort(), Aborted);
        assert_eq!(lifecycle.history().len(), 2);
    }
}
