//! Report and dataset files
//!
//! Every output is written to a temporary file in the destination directory
//! and renamed into place, so readers never see a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::html::render_reindex_report;
use crate::app::join::EnrichedRecord;
use crate::app::reconcile::ReconciliationReport;
use crate::errors::{LogError, LogResult, ReportError, ReportResult};

/// Write `contents` to `path` atomically
///
/// # Errors
///
/// Returns `ReportError::Io` if the temporary file cannot be written and
/// `ReportError::AtomicOperationFailed` if it cannot be renamed into place
pub fn write_atomic(path: &Path, contents: &[u8]) -> ReportResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(&directory).map_err(io_error)?;
    temp.write_all(contents).map_err(io_error)?;
    temp.flush().map_err(io_error)?;

    temp.persist(path)
        .map_err(|e| ReportError::AtomicOperationFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Write the unexplained zero-request dataset IDs, one per line
pub fn write_zero_request_list(path: &Path, report: &ReconciliationReport) -> ReportResult<()> {
    let mut contents = String::new();
    for dataset_id in &report.sets.zero_request_unexplained {
        contents.push_str(dataset_id);
        contents.push('\n');
    }

    write_atomic(path, contents.as_bytes())?;
    info!(
        "Wrote {} unexplained zero-request datasets to {}",
        report.sets.zero_request_unexplained.len(),
        path.display()
    );
    Ok(())
}

/// Write the HTML re-index report
pub fn write_reindex_report(path: &Path, report: &ReconciliationReport) -> ReportResult<()> {
    let html = render_reindex_report(&report.reindex_candidates, report.options.threshold);

    write_atomic(path, html.as_bytes())?;
    info!(
        "Wrote re-index report with {} candidates to {}",
        report.reindex_candidates.len(),
        path.display()
    );
    Ok(())
}

/// Store enriched records as JSON lines
pub fn save_enriched_dataset(path: &Path, records: &[EnrichedRecord]) -> ReportResult<()> {
    let mut contents = Vec::new();
    for record in records {
        serde_json::to_writer(&mut contents, record)?;
        contents.push(b'\n');
    }

    write_atomic(path, &contents)?;
    info!(
        "Stored {} enriched records at {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Load enriched records stored by [`save_enriched_dataset`]
///
/// # Errors
///
/// Returns `LogError::NotFound` for a missing file and
/// `LogError::InvalidDatasetRecord` for a line that is not a stored record
pub async fn load_enriched_dataset<P: AsRef<Path>>(path: P) -> LogResult<Vec<EnrichedRecord>> {
    let path = path.as_ref();
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

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| LogError::InvalidDatasetRecord {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }

    info!(
        "Loaded {} enriched records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}
