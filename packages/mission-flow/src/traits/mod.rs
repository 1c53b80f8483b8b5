//! Collaborator trait abstractions.
//!
//! These traits define the narrow interfaces the controller consumes;
//! applications plug in their own fetching, extraction, scoring,
//! summarization and storage.

pub mod extractor;
pub mod fetcher;
pub mod observer;
pub mod scorer;
pub mod sink;
pub mod summarizer;
