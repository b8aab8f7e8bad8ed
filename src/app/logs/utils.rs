//! Utility functions for log processing
//!
//! Convenience functions that fold one or more JSON-lines log files into the
//! shapes the rest of the pipeline consumes.

use std::path::Path;

use futures::StreamExt;

use super::streaming::LogStreamer;
use super::types::{LogStats, ParseOutcome};
use crate::app::join::{enrich_log_record, EnrichedRecord};
use crate::app::reconcile::RequestCounts;
use crate::app::reference::ReferenceTables;
use crate::errors::LogResult;

/// Count requests per dataset across log files
///
/// Records are folded into the counter as they are parsed and then dropped.
/// Skipped lines are tallied in the returned statistics.
///
/// # Example
///
/// ```rust,no_run
/// use spandex_usage::app::logs::count_requests;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (counts, stats) = count_requests(&["week1.logs.json", "week2.logs.json"]).await?;
/// println!("{} requests, {} lines skipped", counts.total_requests(), stats.skipped());
/// # Ok(())
/// # }
/// ```
pub async fn count_requests<P: AsRef<Path>>(
    log_paths: &[P],
) -> LogResult<(RequestCounts, LogStats)> {
    let mut counts = RequestCounts::new();
    let mut stats = LogStats::new();

    let mut streamer = LogStreamer::new();
    for path in log_paths {
        {
            let mut stream = streamer.stream(path).await?;
            while let Some(result) = stream.next().await {
                if let ParseOutcome::Parsed(record) = result? {
                    counts.record(&record.dataset_id);
                }
            }
        }
        stats.merge(streamer.stats());
        streamer.reset();
    }

    Ok((counts, stats))
}

/// Enrich every parsed request across log files
///
/// Produces one [`EnrichedRecord`] per request, carrying the request time and
/// query rather than a count.
pub async fn extract_enriched_records<P: AsRef<Path>>(
    log_paths: &[P],
    tables: &ReferenceTables,
) -> LogResult<(Vec<EnrichedRecord>, LogStats)> {
    let mut records = Vec::new();
    let mut stats = LogStats::new();

    let mut streamer = LogStreamer::new();
    for path in log_paths {
        {
            let mut stream = streamer.stream(path).await?;
            while let Some(result) = stream.next().await {
                if let Some(record) = result?.into_record() {
                    records.push(enrich_log_record(record, tables));
                }
            }
        }
        stats.merge(streamer.stats());
        streamer.reset();
    }

    Ok((records, stats))
}
