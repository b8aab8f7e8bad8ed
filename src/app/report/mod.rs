//! Run summaries and output files
//!
//! - [`summary`] - Plain-text tables and findings printed after a run
//! - [`html`] - HTML re-index report
//! - [`output`] - Atomic writers for the reports and the enriched dataset

pub mod html;
pub mod output;
pub mod summary;

pub use html::{escape_html, render_reindex_report, REINDEX_COLUMNS};
pub use output::{
    load_enriched_dataset, save_enriched_dataset, write_atomic, write_reindex_report,
    write_zero_request_list,
};
pub use summary::{
    format_table, render_domain_distribution, render_extract_summary, render_reconcile_summary,
    render_top_datasets,
};
