//! Core application logic for spandex_usage
//!
//! This module contains the reference table loader, the request log parser,
//! the metadata join, the reconciliation engine, the index snapshot source and
//! the report writers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spandex_usage::app::{
//!     count_requests, reconcile, IndexSource, ReconcileOptions, ReferencePaths, ReferenceTables,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tables = ReferenceTables::load(&ReferencePaths {
//!     dataset_id_fxf_map: "dataset_fxfs.tsv".into(),
//!     fxf_domain_map: "fxf_domains.tsv".into(),
//!     app_backing_map: Some("app_fxfs.tsv".into()),
//! })
//! .await?;
//! let indexed = IndexSource::Snapshot("spandex_datasets".into()).dataset_ids().await?;
//! let (counts, stats) = count_requests(&["suggest.logs.json"]).await?;
//!
//! let report = reconcile(&counts, &indexed, &tables, &ReconcileOptions::default())
//!     .with_skipped_log_lines(stats.skipped());
//! println!("{} re-index candidates", report.reindex_candidates.len());
//! # Ok(())
//! # }
//! ```

pub mod index;
pub mod join;
pub mod logs;
pub mod reconcile;
pub mod reference;
pub mod report;

// Re-export main public API
pub use index::{IndexClientConfig, IndexSource, SearchIndexClient};
pub use join::{enrich_log_record, join_metadata, EnrichedRecord};
pub use logs::{
    count_requests, extract_enriched_records, read_counted_logs, LogRecord, LogStats,
    LogStreamer, ParseOutcome, SkipReason,
};
pub use reconcile::{
    reconcile, DomainBucket, ReconcileOptions, ReconciliationReport, ReconciliationSets,
    ReindexCandidate, RequestCounts,
};
pub use reference::{ReferencePaths, ReferenceTables};
pub use report::{
    load_enriched_dataset, render_extract_summary, render_reconcile_summary,
    save_enriched_dataset, write_reindex_report, write_zero_request_list,
};
