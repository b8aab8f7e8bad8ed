//! Plain-text run summaries
//!
//! Renders the reconciliation report as the aligned tables and one-line
//! findings printed at the end of a run.

use crate::app::reconcile::{DomainCount, ReconciliationReport, TopDataset};

/// Render rows as a left-aligned text table
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: Vec<&str>| -> String {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = render_row(headers.to_vec());
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Top datasets as a `dataset_id, fxf, request_count` table
pub fn render_top_datasets(top: &[TopDataset]) -> String {
    let rows: Vec<Vec<String>> = top
        .iter()
        .map(|t| {
            vec![
                t.dataset_id.clone(),
                t.fxf.clone().unwrap_or_default(),
                t.request_count.to_string(),
            ]
        })
        .collect();
    format_table(&["dataset_id", "fxf", "request_count"], &rows)
}

/// Zero-request domain distribution as a `domain, dataset_count` table
pub fn render_domain_distribution(distribution: &[DomainCount], limit: usize) -> String {
    let rows: Vec<Vec<String>> = distribution
        .iter()
        .take(limit)
        .map(|d| vec![d.domain.to_string(), d.dataset_count.to_string()])
        .collect();
    format_table(&["domain", "dataset_count"], &rows)
}

fn push_common_findings(out: &mut String, report: &ReconciliationReport) {
    out.push_str(&format!(
        "Found {} datasets in the Spandex index\n",
        report.indexed_count()
    ));
    out.push_str(&format!("Found {} suggest requests\n", report.total_requests));
    if report.skipped_log_lines > 0 {
        out.push_str(&format!(
            "Skipped {} unparseable log lines\n",
            report.skipped_log_lines
        ));
    }

    out.push_str("\nTop datasets by request count\n");
    out.push_str(&render_top_datasets(&report.top_datasets));

    out.push_str(&format!(
        "\nNumber of unique datasets receiving suggestion requests: {}\n",
        report.requested_count()
    ));
    out.push_str(&format!(
        "{} datasets in Spandex received 0 suggest requests\n",
        report.sets.zero_request.len()
    ));

    out.push_str("\nTop domains among datasets receiving zero requests\n");
    out.push_str(&render_domain_distribution(
        &report.domain_distribution,
        report.options.top_n,
    ));
}

/// Summary printed by a reconciliation run
pub fn render_reconcile_summary(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    push_common_findings(&mut out, report);

    out.push_str(&format!(
        "\n{} datasets in Spandex received 0 suggest requests and don't back an app\n",
        report.sets.zero_request_unexplained.len()
    ));
    out.push_str(&format!(
        "{} datasets that are missing from Spandex received one or more suggest requests\n",
        report.sets.missing_from_index.len()
    ));
    out.push_str(&format!(
        "{} of them received over {} requests\n",
        report.reindex_candidates.len(),
        report.options.threshold
    ));
    out
}

/// Summary printed by a log extraction run
pub fn render_extract_summary(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    push_common_findings(&mut out, report);

    out.push_str(&format!(
        "\n{} / {} datasets in Spandex are from non-customer domains\n",
        report.non_customer_indexed,
        report.indexed_count()
    ));
    out
}
