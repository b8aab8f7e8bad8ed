//! HTML re-index report
//!
//! The report is mailed as-is: a subject line, a blank line, then an HTML
//! fragment with a heading, a note on the threshold and one table row per
//! candidate.

use crate::app::reconcile::ReindexCandidate;

/// Columns of the candidate table, in order
pub const REINDEX_COLUMNS: [&str; 5] = ["domain", "fxf", "dataset_id", "request_count", "app_urls"];

/// Render the re-index report for the given candidates
///
/// An empty candidate list renders a report stating there are none.
pub fn render_reindex_report(candidates: &[ReindexCandidate], threshold: u64) -> String {
    let count = candidates.len();
    let noun = if count == 1 { "dataset" } else { "datasets" };

    let mut out = format!(
        "[SPANDEX] {} {} to potentially reinsert into Spandex\n\n",
        count, noun
    );

    if candidates.is_empty() {
        out.push_str("<h3>Found no datasets that potentially ought to be put into spandex</h3>\n");
        out.push_str(&format!(
            "<p>No dataset missing from the index has over {} requests.</p>\n",
            threshold
        ));
        return out;
    }

    out.push_str(&format!(
        "<h3>Found {} {} that potentially ought to be put into spandex</h3>\n",
        count, noun
    ));
    out.push_str(&format!(
        "<p>They each have over {} requests.</p>\n",
        threshold
    ));
    out.push_str(&render_table(candidates));
    out
}

fn render_table(candidates: &[ReindexCandidate]) -> String {
    let mut table = String::from("<table border=\"1\" class=\"dataframe\">\n  <thead>\n    <tr>\n");
    for column in REINDEX_COLUMNS {
        table.push_str(&format!("      <th>{}</th>\n", column));
    }
    table.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for candidate in candidates {
        let request_count = candidate.request_count.to_string();
        let cells = [
            candidate.domain.as_deref().unwrap_or_default(),
            candidate.fxf.as_deref().unwrap_or_default(),
            candidate.dataset_id.as_str(),
            request_count.as_str(),
            candidate.app_urls.as_deref().unwrap_or_default(),
        ];

        table.push_str("    <tr>\n");
        for cell in cells {
            table.push_str(&format!("      <td>{}</td>\n", escape_html(cell)));
        }
        table.push_str("    </tr>\n");
    }

    table.push_str("  </tbody>\n</table>\n");
    table
}

/// Escape text for an HTML element body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
