//! Integration tests for the reconciliation pipeline
//!
//! These tests drive the public API from reference files on disk through to
//! the written reports, the way a reconcile run does.

use std::collections::BTreeSet;
use std::path::Path;

use spandex_usage::app::index::read_index_snapshot;
use spandex_usage::app::{
    read_counted_logs, reconcile, write_reindex_report, write_zero_request_list, DomainBucket,
    IndexSource, ReconcileOptions, ReferencePaths, ReferenceTables, RequestCounts,
};
use tempfile::TempDir;

/// Write reference tables and return their paths
fn write_reference_files(dir: &Path) -> ReferencePaths {
    let datasets = dir.join("dataset_fxfs.tsv");
    let domains = dir.join("fxf_domains.tsv");
    let apps = dir.join("app_fxfs.tsv");

    std::fs::write(
        &datasets,
        "alpha.1\taaaa-0001\t12\t2019-03-01 10:00:00\n\
         alpha.2\taaaa-0002\t3\t2019-03-02 10:00:00\n\
         alpha.3\taaaa-0003\t1\n\
         alpha.4\taaaa-0004\t7\t2019-03-04 10:00:00\n\
         alpha.5\taaaa-0005\n",
    )
    .unwrap();
    std::fs::write(
        &domains,
        "aaaa-0001\tdata.cityofchicago.org\tSF100\n\
         aaaa-0002\tdata.cityofchicago.org\tSF100\n\
         aaaa-0003\tdemo.example.com\n\
         aaaa-0004\tdata.seattle.gov\tSF200\t2018-01-01 00:00:00\n",
    )
    .unwrap();
    std::fs::write(
        &apps,
        "aaaa-0003\tdemo.example.com\topen_budget\thttps://demo.example.com/budget\n",
    )
    .unwrap();

    ReferencePaths {
        dataset_id_fxf_map: datasets,
        fxf_domain_map: domains,
        app_backing_map: Some(apps),
    }
}

async fn load_fixture(dir: &Path) -> ReferenceTables {
    ReferenceTables::load(&write_reference_files(dir))
        .await
        .unwrap()
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn test_app_backed_zero_request_datasets_are_explained() {
    // Test that app-backed indexed datasets leave the zero-request list
    let dir = TempDir::new().unwrap();
    let tables = load_fixture(dir.path()).await;

    let snapshot = dir.path().join("spandex_datasets");
    std::fs::write(&snapshot, "alpha.1\nalpha.2\nalpha.3\n").unwrap();
    let counted = dir.path().join("counted_logs");
    std::fs::write(&counted, "      5 alpha.1\n").unwrap();

    let indexed = read_index_snapshot(&snapshot).await.unwrap();
    let counts = read_counted_logs(&counted).await.unwrap();
    let report = reconcile(&counts, &indexed, &tables, &ReconcileOptions::default());

    assert_eq!(report.request_counts, counts);
    assert_eq!(report.sets.zero_request, ids(&["alpha.2", "alpha.3"]));
    assert_eq!(report.sets.zero_request_unexplained, ids(&["alpha.2"]));
    assert_eq!(report.app_backed_zero_request(), ids(&["alpha.3"]));

    let zero_request_path = dir.path().join("zero_request_datasets");
    write_zero_request_list(&zero_request_path, &report).unwrap();
    assert_eq!(
        std::fs::read_to_string(&zero_request_path).unwrap(),
        "alpha.2\n"
    );
}

#[tokio::test]
async fn test_heavily_requested_missing_dataset_is_reported() {
    // Test that a missing dataset over the threshold reaches the HTML report
    let dir = TempDir::new().unwrap();
    let tables = load_fixture(dir.path()).await;

    let snapshot = dir.path().join("spandex_datasets");
    std::fs::write(&snapshot, "alpha.1\n").unwrap();
    let counted = dir.path().join("counted_logs");
    std::fs::write(
        &counted,
        "   1500 alpha.2\n    999 alpha.4\n   1000 alpha.5\n     20 alpha.1\n",
    )
    .unwrap();

    let indexed = IndexSource::Snapshot(snapshot).dataset_ids().await.unwrap();
    let counts = read_counted_logs(&counted).await.unwrap();
    let report = reconcile(&counts, &indexed, &tables, &ReconcileOptions::default());

    assert_eq!(
        report.sets.missing_from_index,
        ids(&["alpha.2", "alpha.4", "alpha.5"])
    );
    // The threshold is exclusive: 1000 requests is not enough
    assert_eq!(report.sets.reindex_candidates, ids(&["alpha.2"]));

    let candidate = &report.reindex_candidates[0];
    assert_eq!(candidate.dataset_id, "alpha.2");
    assert_eq!(candidate.fxf.as_deref(), Some("aaaa-0002"));
    assert_eq!(candidate.domain.as_deref(), Some("data.cityofchicago.org"));
    assert_eq!(candidate.request_count, 1500);

    let report_path = dir.path().join("non_indexed_with_counts");
    write_reindex_report(&report_path, &report).unwrap();
    let html = std::fs::read_to_string(&report_path).unwrap();
    assert!(html.starts_with("[SPANDEX] 1 dataset to potentially reinsert into Spandex"));
    assert!(html.contains("<td>alpha.2</td>"));
    assert!(html.contains("<td>1500</td>"));
    assert!(!html.contains("<td>alpha.5</td>"));
}

#[tokio::test]
async fn test_domain_distribution_and_customer_flags() {
    // Test the per-domain view of zero-request datasets
    let dir = TempDir::new().unwrap();
    let tables = load_fixture(dir.path()).await;

    let indexed = ids(&["alpha.1", "alpha.2", "alpha.4", "alpha.5", "alpha.9"]);
    let counts = RequestCounts::from_pairs([("alpha.1", 3)]);
    let report = reconcile(&counts, &indexed, &tables, &ReconcileOptions::default());

    let buckets: Vec<(DomainBucket, usize)> = report
        .domain_distribution
        .iter()
        .map(|entry| (entry.domain.clone(), entry.dataset_count))
        .collect();
    assert_eq!(
        buckets,
        vec![
            (DomainBucket::Unknown, 2),
            (
                DomainBucket::Known("data.cityofchicago.org".to_string()),
                1
            ),
            (DomainBucket::Known("data.seattle.gov".to_string()), 1),
        ]
    );

    let seattle = report
        .zero_request
        .iter()
        .find(|record| record.dataset_id == "alpha.4")
        .unwrap();
    // Deleted domains are not customer domains
    assert_eq!(seattle.is_customer_domain, Some(false));

    let unknown = report
        .zero_request
        .iter()
        .find(|record| record.dataset_id == "alpha.9")
        .unwrap();
    assert_eq!(unknown.is_customer_domain, None);
    assert!(unknown.fxf.is_none());
}

#[tokio::test]
async fn test_empty_inputs_still_write_both_reports() {
    // Test that an empty run produces empty but well-formed outputs
    let dir = TempDir::new().unwrap();
    let tables = load_fixture(dir.path()).await;

    let counts = RequestCounts::new();
    let report = reconcile(
        &counts,
        &BTreeSet::new(),
        &tables,
        &ReconcileOptions {
            threshold: 10,
            top_n: 5,
        },
    );
    assert_eq!(report.total_requests, 0);
    assert!(report.top_datasets.is_empty());

    let zero_request_path = dir.path().join("zero_request_datasets");
    let report_path = dir.path().join("non_indexed_with_counts");
    write_zero_request_list(&zero_request_path, &report).unwrap();
    write_reindex_report(&report_path, &report).unwrap();

    assert_eq!(std::fs::read_to_string(&zero_request_path).unwrap(), "");
    let html = std::fs::read_to_string(&report_path).unwrap();
    assert!(html.starts_with("[SPANDEX] 0 datasets"));
    assert!(html.contains("No dataset missing from the index has over 10 requests."));
}

#[tokio::test]
async fn test_malformed_app_table_fails_the_load() {
    // Test that the app-backing table must have exactly four columns
    let dir = TempDir::new().unwrap();
    let paths = write_reference_files(dir.path());
    std::fs::write(
        paths.app_backing_map.as_ref().unwrap(),
        "aaaa-0003\tdemo.example.com\topen_budget\n",
    )
    .unwrap();

    assert!(ReferenceTables::load(&paths).await.is_err());
}
