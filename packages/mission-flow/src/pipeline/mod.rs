//! Mission pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Lifecycle (CREATED → ... → DONE / ABORTED)
//! - Planning (normalize, dedup, truncate candidates)
//! - Harvest (bounded-concurrency fetch → extract → score with retry)
//! - Aggregation (threshold filter, status)
//! - Summarization and persistence

pub mod aggregate;
pub mod controller;
mod harvest;
pub mod lifecycle;
pub mod planning;
pub mod retry;

pub use aggregate::{aggregate, determine_status, Aggregation};
pub use controller::{MissionController, LOG_RUN_TIMEOUT};
pub use lifecycle::{Lifecycle, MissionState, StateTransition};
pub use planning::{normalize_url, plan_candidates, MissionPlan, PlannedCandidate};
pub use retry::RetryPolicy;
