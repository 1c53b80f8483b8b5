//! Persistence traits for mission output.
//!
//! Split in two, like the page/summary caches they replace:
//! - `ResultSink`: stores the `MissionResult` itself
//! - `MissionLogger`: records run metadata (best-effort)

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::result::{MissionResult, RunTiming};

/// Stores final mission results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist_result(&self, result: &MissionResult) -> StorageResult<()>;
}

/// Records one entry per mission run.
///
/// Best-effort: the controller bounds the call with a timeout and never lets
/// a failure here change the mission outcome.
#[async_trait]
pub trait MissionLogger: Send + Sync {
    async fn log_run(&self, result: &MissionResult, timing: &RunTiming) -> StorageResult<()>;
}

#[async_trait]
impl<S: ResultSink + ?Sized> ResultSink for std::sync::Arc<S> {
    async fn persist_result(&self, result: &MissionResult) -> StorageResult<()> {
        (**self).persist_result(result).await
    }
}

#[async_trait]
impl<L: MissionLogger + ?Sized> MissionLogger for std::sync::Arc<L> {
    async fn log_run(&self, result: &MissionResult, timing: &RunTiming) -> StorageResult<()> {
        (**self).log_run(result, timing).await
    }
}
