//! Cross-mission statistics over a run log.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stores::RunLogEntry;
use crate::types::result::MissionStatus;

/// Source quality for one domain across every logged mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub domain: String,
    /// Attempts against this domain
    pub sources: usize,
    /// Attempts that made it into a summary
    pub kept: usize,
    /// Mean over attempts that got a score; `None` if none did
    pub mean_score: Option<f64>,
}

/// Aggregate view of a run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_runs: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    /// COMPLETE and PARTIAL runs over all runs, 0 for an empty log
    pub success_rate: f64,
    /// Mean wall-clock run time, 0 for an empty log
    pub mean_total_ms: f64,
    /// Busiest domains first
    pub domains: Vec<DomainStats>,
}

impl RunStats {
    pub fn from_entries(entries: &[RunLogEntry]) -> Self {
        let count = |status: MissionStatus| entries.iter().filter(|e| e.status == status).count();
        let (complete, partial, failed) = (
            count(MissionStatus::Complete),
            count(MissionStatus::Partial),
            count(MissionStatus::Failed),
        );

        let total_runs = entries.len();
        let (success_rate, mean_total_ms) = if total_runs == 0 {
            (0.0, 0.0)
        } else {
            let total_ms: u64 = entries.iter().map(|e| e.total_ms).sum();
            (
                (complete + partial) as f64 / total_runs as f64,
                total_ms as f64 / total_runs as f64,
            )
        };

        Self {
            total_runs,
            complete,
            partial,
            failed,
            success_rate,
            mean_total_ms,
            domains: domain_stats(entries),
        }
    }
}

fn domain_stats(entries: &[RunLogEntry]) -> Vec<DomainStats> {
    // (sources, kept, score sum, scored)
    let mut by_domain: IndexMap<&str, (usize, usize, f64, usize)> = IndexMap::new();
    for source in entries.iter().flat_map(|e| &e.sources) {
        let tally = by_domain.entry(source.domain.as_str()).or_default();
        tally.0 += 1;
        if source.kept {
            tally.1 += 1;
        }
        if let Some(score) = source.score {
            tally.2 += score;
            tally.3 += 1;
        }
    }

    let mut domains: Vec<DomainStats> = by_domain
        .into_iter()
        .map(|(domain, (sources, kept, sum, scored))| DomainStats {
            domain: domain.to_string(),
            sources,
            kept,
            mean_score: (scored > 0).then(|| sum / scored as f64),
        })
        .collect();
    domains.sort_by(|a, b| b.sources.cmp(&a.sources).then_with(|| a.domain.cmp(&b.domain)));
    domains
}
