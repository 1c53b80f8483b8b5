//! Controller configuration.

use std::time::Duration;

use crate::error::MissionError;

/// Configuration for the mission controller.
///
/// Together with the request's `max_sources` and `quality_threshold`, these
/// are the only options that influence control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionConfig {
    /// Maximum calls per retryable stage (fetch, extract), including the first.
    ///
    /// Default: 3.
    pub retry_limit: u32,

    /// Delay before the first retry. Doubles for each further retry.
    ///
    /// Default: 2s.
    pub backoff_base: Duration,

    /// Upper bound on any single backoff delay.
    ///
    /// Default: 30s.
    pub backoff_cap: Duration,

    /// Maximum candidate pipelines in flight at once.
    ///
    /// Default: 4.
    pub concurrency: usize,

    /// Wall-clock budget for harvesting. Pending attempts fail with
    /// `Timeout` when it elapses.
    ///
    /// Default: 120s.
    pub mission_timeout: Duration,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(30),
            concurrency: 4,
            mission_timeout: Duration::from_secs(120),
        }
    }
}

impl MissionConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_cap = cap;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_mission_timeout(mut self, timeout: Duration) -> Self {
        self.mission_timeout = timeout;
        self
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.retry_limit == 0 {
            return Err(MissionError::config("retry_limit must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(MissionError::config("concurrency must be at least 1"));
        }
        if self.backoff_base > self.backoff_cap {
            return Err(MissionError::config(format!(
                "backoff base {:?} exceeds cap {:?}",
                self.backoff_base, self.backoff_cap
            )));
        }
        if self.mission_timeout.is_zero() {
            return Err(MissionError::config("mission_timeout must be non-zero"));
        }
        Ok(())
    }
}
