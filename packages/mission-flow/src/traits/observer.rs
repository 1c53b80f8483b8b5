//! Progress observation hooks.

use crate::pipeline::lifecycle::MissionState;
use crate::types::attempt::SourceAttempt;
use crate::types::result::MissionId;

/// Receives progress notifications from the controller.
///
/// Called synchronously from the controller task, so implementations should
/// return quickly (print, send on a channel, bump a progress bar).
pub trait MissionObserver: Send + Sync {
    /// The mission moved to a new lifecycle state.
    fn on_transition(&self, _mission_id: &MissionId, _from: MissionState, _to: MissionState) {}

    /// A candidate reached a terminal state during harvesting.
    fn on_attempt_finished(&self, _mission_id: &MissionId, _attempt: &SourceAttempt) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MissionObserver for NoopObserver {}

impl<O: MissionObserver + ?Sized> MissionObserver for std::sync::Arc<O> {
    fn on_transition(&self, mission_id: &MissionId, from: MissionState, to: MissionState) {
        (**self).on_transition(mission_id, from, to)
    }

    fn on_attempt_finished(&self, mission_id: &MissionId, attempt: &SourceAttempt) {
        (**self).on_attempt_finished(mission_id, attempt)
    }
}
