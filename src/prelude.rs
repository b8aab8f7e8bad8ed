//! Prelude module for the spandex_usage library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use spandex_usage::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use spandex_usage::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let tables = ReferenceTables::load(&ReferencePaths {
//!         dataset_id_fxf_map: PathBuf::from("dataset_fxfs.tsv"),
//!         fxf_domain_map: PathBuf::from("fxf_domains.tsv"),
//!         app_backing_map: None,
//!     })
//!     .await?;
//!     let counts = read_counted_logs("counted_requests").await?;
//!     let indexed = read_index_snapshot("spandex_datasets").await?;
//!
//!     let report = reconcile(&counts, &indexed, &tables, &ReconcileOptions::default());
//!     println!("{}", render_reconcile_summary(&report));
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    // Metadata join
    join_metadata,
    EnrichedRecord,

    // Log input
    count_requests,
    extract_enriched_records,
    read_counted_logs,
    LogStats,
    LogStreamer,
    ParseOutcome,

    // Reconciliation
    reconcile,
    ReconcileOptions,
    ReconciliationReport,
    RequestCounts,

    // Reference tables and index contents
    IndexClientConfig,
    IndexSource,
    ReferencePaths,
    ReferenceTables,

    // Reports
    render_reconcile_summary,
    write_reindex_report,
    write_zero_request_list,
};
pub use crate::app::index::read_index_snapshot;

// Configuration
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_REINDEX_THRESHOLD, DEFAULT_TOP_N, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::collections::BTreeSet;
pub use std::path::{Path, PathBuf};

// Common external crate re-exports for convenience
pub use tokio;
