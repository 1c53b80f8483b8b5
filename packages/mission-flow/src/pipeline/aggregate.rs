//! Result aggregation.
//!
//! Pure functions of (terminal attempts, threshold). Output ordering follows
//! candidate position, never completion order, so replaying the same set of
//! attempts in any order yields the same result.

use crate::types::attempt::{AttemptStage, FailureKind, SourceAttempt};
use crate::types::result::{ExcludedAttempt, ExclusionReason, MissionStatus};

/// Attempts partitioned against the quality threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Succeeded attempts scoring at or above the threshold
    pub successful: Vec<SourceAttempt>,
    /// Everything else, with the reason
    pub excluded: Vec<ExcludedAttempt>,
}

impl Aggregation {
    pub fn total(&self) -> usize {
        self.successful.len() + self.excluded.len()
    }
}

/// Split terminal attempts into successful and excluded.
pub fn aggregate(attempts: impl IntoIterator<Item = SourceAttempt>, threshold: f64) -> Aggregation {
    let mut sorted: Vec<SourceAttempt> = attempts.into_iter().collect();
    sorted.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.url.cmp(&b.url)));

    let mut aggregation = Aggregation::default();
    for attempt in sorted {
        match (attempt.stage, attempt.score) {
            (AttemptStage::Succeeded, Some(score)) if score >= threshold => {
                aggregation.successful.push(attempt);
            }
            (AttemptStage::Succeeded, Some(score)) => {
                aggregation.excluded.push(ExcludedAttempt {
                    attempt,
                    reason: ExclusionReason::BelowThreshold { score, threshold },
                });
            }
            _ => {
                // A non-terminal attempt here means the pipeline never finished.
                let kind = attempt.failure_kind().unwrap_or(FailureKind::Timeout);
                aggregation.excluded.push(ExcludedAttempt {
                    attempt,
                    reason: ExclusionReason::Failed { kind },
                });
            }
        }
    }
    aggregation
}

/// Overall status from the aggregation and the summarizer outcome.
///
/// FAILED when nothing survived; COMPLETE only when every attempted
/// candidate survived and the summary was produced; PARTIAL otherwise.
pub fn determine_status(aggregation: &Aggregation, summary_produced: bool) -> MissionStatus {
    if aggregation.successful.is_empty() {
        MissionStatus::Failed
    } else if summary_produced && aggregation.excluded.is_empty() {
        MissionStatus::Complete
    } else {
        MissionStatus::Partial
    }
}
