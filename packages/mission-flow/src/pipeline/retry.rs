//! Per-stage retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::StageResult;
use crate::types::config::MissionConfig;

/// Retry policy for a single fetch or extract stage.
///
/// `max_attempts` counts calls, not retries: a stage that always fails
/// transiently is invoked exactly `max_attempts` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self {
            max_attempts,
            base,
            cap,
        }
    }

    pub fn from_config(config: &MissionConfig) -> Self {
        Self::new(config.retry_limit, config.backoff_base, config.backoff_cap)
    }

    /// Delay before retry `n` (n >= 1): `min(base * 2^(n-1), cap)`.
    pub fn delay_for(&self, n: u32) -> Duration {
        let factor = 2u32.saturating_pow(n.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// `calls` is bumped before every invocation. It lives outside this future
    /// so the count survives if the future is dropped mid-backoff.
    pub async fn run<T, F, Fut>(&self, stage: &str, url: &str, calls: &mut u32, mut op: F) -> StageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StageResult<T>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            *calls += 1;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && tries < self.max_attempts => {
                    let delay = self.delay_for(tries);
                    warn!(
                        url = %url,
                        stage = stage,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!(
                        url = %url,
                        stage = stage,
                        attempt = tries,
                        error = %e,
                        "Giving up on stage"
                    );
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&MissionConfig::default())
    }
}
