//! Content extractor implementations.

pub mod html;

pub use html::{normalize_whitespace, HtmlExtractor};
