//! spandex_usage Library
//!
//! Reconciles suggest-endpoint request logs with the contents of the Spandex
//! autocomplete index. Finds indexed datasets nobody queries and heavily
//! requested datasets missing from the index, enriched with dataset, domain,
//! and app metadata from tab-delimited reference tables.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
