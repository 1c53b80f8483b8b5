//! Data types for research missions.

pub mod attempt;
pub mod config;
pub mod content;
pub mod request;
pub mod result;
