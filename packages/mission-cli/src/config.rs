use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use mission_flow::MissionConfig;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub mission: MissionConfig,
    pub output_dir: PathBuf,
    pub requests_per_second: Option<NonZeroU32>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to library defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = MissionConfig::default();

        let retry_limit = parse_or(&lookup, "MISSION_RETRY_LIMIT", defaults.retry_limit)?;
        let backoff_base = parse_or(
            &lookup,
            "MISSION_BACKOFF_BASE_MS",
            defaults.backoff_base.as_millis() as u64,
        )?;
        let backoff_cap = parse_or(
            &lookup,
            "MISSION_BACKOFF_CAP_MS",
            defaults.backoff_cap.as_millis() as u64,
        )?;
        let concurrency = parse_or(&lookup, "MISSION_CONCURRENCY", defaults.concurrency)?;
        let timeout_secs = parse_or(
            &lookup,
            "MISSION_TIMEOUT_SECS",
            defaults.mission_timeout.as_secs(),
        )?;

        let mission = MissionConfig::new()
            .with_retry_limit(retry_limit)
            .with_backoff(
                Duration::from_millis(backoff_base),
                Duration::from_millis(backoff_cap),
            )
            .with_concurrency(concurrency)
            .with_mission_timeout(Duration::from_secs(timeout_secs));

        let requests_per_second = lookup("MISSION_REQUESTS_PER_SECOND")
            .map(|v| {
                v.trim()
                    .parse::<NonZeroU32>()
                    .context("MISSION_REQUESTS_PER_SECOND must be a positive integer")
            })
            .transpose()?;

        Ok(Self {
            mission,
            output_dir: lookup("MISSION_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("missions")),
            requests_per_second,
            user_agent: lookup("MISSION_USER_AGENT").filter(|v| !v.trim().is_empty()),
        })
    }

    /// Append-only run log next to the result files.
    pub fn run_log_path(&self) -> PathBuf {
        self.output_dir.join("runs.jsonl")
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got {value:?}")),
        None => Ok(default),
    }
}
