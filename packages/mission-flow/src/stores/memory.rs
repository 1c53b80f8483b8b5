//! In-memory sink for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StorageResult;
use crate::stores::RunLogEntry;
use crate::traits::sink::{MissionLogger, ResultSink};
use crate::types::result::{MissionId, MissionResult, RunTiming};

/// Keeps mission results and run log entries in memory.
///
/// Implements both `ResultSink` and `MissionLogger`, so one `Arc<MemorySink>`
/// can be handed to the controller twice. Data is lost on drop.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: RwLock<HashMap<MissionId, MissionResult>>,
    runs: RwLock<Vec<RunLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self, mission_id: &MissionId) -> Option<MissionResult> {
        read(&self.results).get(mission_id).cloned()
    }

    pub fn result_count(&self) -> usize {
        read(&self.results).len()
    }

    /// Run log entries in the order they were recorded.
    pub fn runs(&self) -> Vec<RunLogEntry> {
        read(&self.runs).clone()
    }

    pub fn clear(&self) {
        write(&self.results).clear();
        write(&self.runs).clear();
    }
}

// Poisoned locks still hold usable data.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn persist_result(&self, result: &MissionResult) -> StorageResult<()> {
        write(&self.results).insert(result.mission_id.clone(), result.clone());
        Ok(())
    }
}

#[async_trait]
impl MissionLogger for MemorySink {
    async fn log_run(&self, result: &MissionResult, timing: &RunTiming) -> StorageResult<()> {
        write(&self.runs).push(RunLogEntry::new(result, timing));
        Ok(())
    }
}
