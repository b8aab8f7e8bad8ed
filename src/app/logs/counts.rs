//! Pre-aggregated request count files
//!
//! For large log volumes the request lines are usually reduced beforehand with
//! `grep | sed | sort | uniq -c`, leaving one `count dataset_id` pair per line.

use std::path::Path;

use tracing::info;

use crate::app::reconcile::RequestCounts;
use crate::errors::{LogError, LogResult};

/// Parse `count dataset_id` pairs
///
/// Pairs are whitespace separated and blank lines are ignored. Repeated IDs
/// are summed.
///
/// # Errors
///
/// Returns `LogError::InvalidCountLine` for a line that is not exactly two
/// fields with a non-negative integer count.
pub fn parse_counted_logs(content: &str) -> LogResult<RequestCounts> {
    let mut counts = RequestCounts::new();

    for (index, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        let invalid = || LogError::InvalidCountLine {
            line: index + 1,
            content: line.trim().to_string(),
        };
        let [count, dataset_id] = fields[..] else {
            return Err(invalid());
        };
        let count: u64 = count.parse().map_err(|_| invalid())?;

        counts.add(dataset_id, count);
    }

    Ok(counts)
}

/// Read a pre-aggregated count file
pub async fn read_counted_logs<P: AsRef<Path>>(path: P) -> LogResult<RequestCounts> {
    let path = path.as_ref();
    info!("Reading counted request logs from {}", path.display());

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LogError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LogError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let counts = parse_counted_logs(&content)?;

    info!(
        "Read {} requests across {} datasets",
        counts.total_requests(),
        counts.distinct_datasets()
    );
    Ok(counts)
}
