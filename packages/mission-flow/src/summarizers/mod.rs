//! Summarizer implementations.

pub mod extractive;

pub use extractive::{ExtractiveSummarizer, StyleProfile};
