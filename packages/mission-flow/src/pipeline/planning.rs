//! Candidate planning: normalize, dedup, truncate.
//!
//! The request's URL ordering is the priority order. Planning never reorders;
//! it only drops later duplicates and everything past `max_sources`.

use indexmap::IndexMap;
use tracing::debug;
use url::Url;

use crate::types::attempt::SourceAttempt;
use crate::types::request::MissionRequest;

/// A candidate that survived planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCandidate {
    /// Index in the planned ordering
    pub position: usize,
    /// URL as written in the request
    pub url: String,
    /// Normalized URL; None when the candidate is not a fetchable http(s) URL
    pub normalized: Option<String>,
}

impl PlannedCandidate {
    /// Dedup key: the normalized URL, or the trimmed raw text when invalid.
    fn key(&self) -> &str {
        self.normalized.as_deref().unwrap_or_else(|| self.url.trim())
    }

    /// Build the PENDING attempt the controller schedules for this candidate.
    pub fn to_attempt(&self) -> SourceAttempt {
        SourceAttempt::new(self.position, self.url.clone(), self.key().to_string())
    }
}

/// Planned candidates plus bookkeeping for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionPlan {
    pub candidates: Vec<PlannedCandidate>,
    /// Candidates dropped as duplicates of an earlier one
    pub duplicates_dropped: usize,
    /// Distinct candidates dropped by the `max_sources` cap
    pub truncated: usize,
}

impl MissionPlan {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Normalize a URL for dedup.
///
/// Lowercases scheme and host, drops the fragment and default port, and
/// strips a trailing `/` from non-root paths. Returns None for anything that
/// is not an absolute http(s) URL with a host.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;
    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// Resolve the request's candidates into the ordered list to harvest.
pub fn plan_candidates(request: &MissionRequest) -> MissionPlan {
    let mut distinct: IndexMap<String, PlannedCandidate> = IndexMap::new();
    let mut duplicates_dropped = 0;

    for url in &request.candidate_urls {
        let candidate = PlannedCandidate {
            position: 0,
            url: url.clone(),
            normalized: normalize_url(url),
        };
        let key = candidate.key().to_string();
        if distinct.contains_key(&key) {
            debug!(url = %url, "Dropping duplicate candidate");
            duplicates_dropped += 1;
            continue;
        }
        distinct.insert(key, candidate);
    }

    let truncated = distinct.len().saturating_sub(request.max_sources);
    let candidates = distinct
        .into_values()
        .take(request.max_sources)
        .enumerate()
        .map(|(position, candidate)| PlannedCandidate {
            position,
            ..candidate
        })
        .collect();

    MissionPlan {
        candidates,
        duplicates_dropped,
        truncated,
    }
}
