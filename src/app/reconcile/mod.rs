//! Request aggregation and index reconciliation
//!
//! Counts requests per dataset and compares the requested datasets with the
//! ones present in the search index:
//!
//! - **zero-request** datasets are indexed but never requested, candidates for
//!   removal unless they back a downstream app;
//! - **missing** datasets are requested but absent from the index, and those
//!   requested more than the threshold are candidates for re-indexing.
//!
//! # Module Organization
//!
//! - [`counts`] - Per-dataset request counter
//! - [`types`] - Options, derived sets and report types
//! - [`engine`] - Set algebra, enrichment and ordering

pub mod counts;
pub mod engine;
pub mod types;

pub use counts::RequestCounts;
pub use engine::{domain_distribution, reconcile, top_datasets};
pub use types::{
    DomainBucket, DomainCount, ReconcileOptions, ReconciliationReport, ReconciliationSets,
    ReindexCandidate, TopDataset,
};
