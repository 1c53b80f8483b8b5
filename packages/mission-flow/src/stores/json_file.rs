//! File-backed sinks: one pretty JSON file per mission, one JSONL run log.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StorageResult;
use crate::stores::RunLogEntry;
use crate::traits::sink::{MissionLogger, ResultSink};
use crate::types::result::{MissionId, MissionResult, RunTiming};

/// Writes each `MissionResult` to `<dir>/<mission_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the result for `mission_id` is (or would be) written.
    pub fn path_for(&self, mission_id: &MissionId) -> PathBuf {
        self.dir.join(format!("{mission_id}.json"))
    }

    /// Read back a persisted result.
    pub async fn load(path: impl AsRef<Path>) -> StorageResult<MissionResult> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn persist_result(&self, result: &MissionResult) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&result.mission_id);
        let json = serde_json::to_vec_pretty(result)?;

        // Write then rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), bytes = json.len(), "Mission result written");
        Ok(())
    }
}

/// Appends one JSON line per mission run to a log file.
#[derive(Debug, Clone)]
pub struct JsonlRunLog {
    path: PathBuf,
}

impl JsonlRunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry back, oldest first.
    pub async fn entries(&self) -> StorageResult<Vec<RunLogEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl MissionLogger for JsonlRunLog {
    async fn log_run(&self, result: &MissionResult, timing: &RunTiming) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_vec(&RunLogEntry::new(result, timing))?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
