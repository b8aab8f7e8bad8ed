//! Flat-file index snapshots
//!
//! A snapshot is a newline separated list of the dataset IDs present in the
//! index, as dumped by an earlier scroll over the index.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::info;

use crate::errors::{IndexError, IndexResult};

/// Parse a snapshot into a set of dataset IDs
///
/// Lines are trimmed, blank lines ignored and duplicates collapse.
pub fn parse_index_snapshot(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a snapshot file
pub async fn read_index_snapshot<P: AsRef<Path>>(path: P) -> IndexResult<BTreeSet<String>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let dataset_ids = parse_index_snapshot(&content);

    info!(
        "Read {} indexed datasets from {}",
        dataset_ids.len(),
        path.display()
    );
    Ok(dataset_ids)
}
