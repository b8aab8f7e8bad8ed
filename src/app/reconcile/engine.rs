//! Aggregation and reconciliation
//!
//! Compares the requested datasets with the indexed ones and enriches the
//! differences. All orderings are total so identical inputs always give an
//! identical report.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::counts::RequestCounts;
use super::types::{
    DomainBucket, DomainCount, ReconcileOptions, ReconciliationReport, ReconciliationSets,
    ReindexCandidate, TopDataset,
};
use crate::app::join::{join_metadata, EnrichedRecord};
use crate::app::reference::ReferenceTables;

impl ReconciliationSets {
    /// Derive every dataset ID set from counts, index contents and references
    pub fn compute(
        counts: &RequestCounts,
        indexed: &BTreeSet<String>,
        tables: &ReferenceTables,
        threshold: u64,
    ) -> Self {
        let requested = counts.requested();

        let zero_request: BTreeSet<String> = indexed.difference(&requested).cloned().collect();
        let missing_from_index: BTreeSet<String> =
            requested.difference(indexed).cloned().collect();

        let app_backed: BTreeSet<String> = indexed
            .union(&requested)
            .filter(|dataset_id| tables.is_app_backed(dataset_id))
            .cloned()
            .collect();
        let zero_request_unexplained = zero_request.difference(&app_backed).cloned().collect();

        let reindex_candidates = missing_from_index
            .iter()
            .filter(|dataset_id| counts.get(dataset_id) > threshold)
            .cloned()
            .collect();

        Self {
            indexed: indexed.clone(),
            requested,
            zero_request,
            missing_from_index,
            app_backed,
            zero_request_unexplained,
            reindex_candidates,
        }
    }
}

/// Most requested datasets, count descending then dataset ID ascending
pub fn top_datasets(
    counts: &RequestCounts,
    tables: &ReferenceTables,
    top_n: usize,
) -> Vec<TopDataset> {
    let mut ranked: Vec<(&str, u64)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(dataset_id, request_count)| TopDataset {
            dataset_id: dataset_id.to_string(),
            fxf: tables.fxf_for(dataset_id).map(str::to_string),
            request_count,
        })
        .collect()
}

/// Count records per resolved domain, count descending then domain ascending
pub fn domain_distribution(records: &[EnrichedRecord]) -> Vec<DomainCount> {
    let mut grouped: BTreeMap<DomainBucket, usize> = BTreeMap::new();
    for record in records {
        *grouped
            .entry(DomainBucket::from_domain(record.domain.as_deref()))
            .or_insert(0) += 1;
    }

    let mut distribution: Vec<DomainCount> = grouped
        .into_iter()
        .map(|(domain, dataset_count)| DomainCount {
            domain,
            dataset_count,
        })
        .collect();
    // Stable sort keeps the bucket order from the map for equal counts
    distribution.sort_by(|a, b| b.dataset_count.cmp(&a.dataset_count));
    distribution
}

/// Reconcile request counts against the index contents
///
/// # Arguments
///
/// * `counts` - Requests per dataset, from raw or pre-aggregated logs
/// * `indexed` - Dataset IDs currently in the index
/// * `tables` - Reference tables for enrichment
/// * `options` - Re-index threshold and report size
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeSet;
/// use spandex_usage::app::reconcile::{reconcile, ReconcileOptions, RequestCounts};
/// use spandex_usage::app::reference::ReferenceTables;
///
/// let counts = RequestCounts::from_pairs([("alpha.3", 100)]);
/// let indexed = BTreeSet::from(["alpha.1".to_string()]);
/// let options = ReconcileOptions { threshold: 50, top_n: 10 };
///
/// let report = reconcile(&counts, &indexed, &ReferenceTables::default(), &options);
/// assert_eq!(report.reindex_candidates.len(), 1);
/// assert!(report.sets.zero_request.contains("alpha.1"));
/// ```
pub fn reconcile(
    counts: &RequestCounts,
    indexed: &BTreeSet<String>,
    tables: &ReferenceTables,
    options: &ReconcileOptions,
) -> ReconciliationReport {
    let sets = ReconciliationSets::compute(counts, indexed, tables, options.threshold);
    debug!(
        "Reconciling {} indexed against {} requested datasets",
        sets.indexed.len(),
        sets.requested.len()
    );

    let zero_request: Vec<EnrichedRecord> = sets
        .zero_request
        .iter()
        .map(|dataset_id| join_metadata(dataset_id, Some(0), tables))
        .collect();

    let missing_from_index: Vec<EnrichedRecord> = sets
        .missing_from_index
        .iter()
        .map(|dataset_id| join_metadata(dataset_id, Some(counts.get(dataset_id)), tables))
        .collect();

    let mut reindex_candidates: Vec<ReindexCandidate> = missing_from_index
        .iter()
        .filter(|record| sets.reindex_candidates.contains(&record.dataset_id))
        .map(ReindexCandidate::from)
        .collect();
    reindex_candidates.sort_by(|a, b| {
        b.request_count
            .cmp(&a.request_count)
            .then_with(|| a.dataset_id.cmp(&b.dataset_id))
    });

    let non_customer_indexed = sets
        .indexed
        .iter()
        .filter(|dataset_id| {
            join_metadata(dataset_id, None, tables).is_customer_domain == Some(false)
        })
        .count();

    let report = ReconciliationReport {
        options: options.clone(),
        request_counts: counts.clone(),
        total_requests: counts.total_requests(),
        top_datasets: top_datasets(counts, tables, options.top_n),
        domain_distribution: domain_distribution(&zero_request),
        zero_request,
        missing_from_index,
        reindex_candidates,
        non_customer_indexed,
        skipped_log_lines: 0,
        sets,
    };

    info!(
        "Reconciled: {} zero-request ({} unexplained), {} missing from index, {} re-index candidates",
        report.sets.zero_request.len(),
        report.sets.zero_request_unexplained.len(),
        report.sets.missing_from_index.len(),
        report.reindex_candidates.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::reference::{
        AppBackingInfo, DatasetReference, DomainInfo, ReferenceTimestamp,
    };

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn dataset(tables: &mut ReferenceTables, dataset_id: &str, fxf: &str) {
        tables.datasets.insert(
            dataset_id.to_string(),
            DatasetReference {
                dataset_id: dataset_id.to_string(),
                fxf: Some(fxf.to_string()),
                version: Some("0".to_string()),
                created_at: Some(ReferenceTimestamp::new("2020-01-01")),
            },
        );
    }

    fn domain(tables: &mut ReferenceTables, fxf: &str, cname: &str, salesforce_id: Option<&str>) {
        tables.domains.insert(
            fxf.to_string(),
            DomainInfo {
                fxf: fxf.to_string(),
                cname: Some(cname.to_string()),
                salesforce_id: salesforce_id.map(str::to_string),
                deleted_at: None,
            },
        );
    }

    fn app(tables: &mut ReferenceTables, fxf: &str) {
        tables.apps.insert(
            fxf.to_string(),
            AppBackingInfo {
                fxf: fxf.to_string(),
                domain: "example.com".to_string(),
                app_type: "open_budget".to_string(),
                app_urls: format!("https://example.com/{}", fxf),
            },
        );
    }

    fn scenario_tables() -> ReferenceTables {
        let mut tables = ReferenceTables::default();
        dataset(&mut tables, "1", "abcd-efgh");
        domain(&mut tables, "abcd-efgh", "example.com", Some("SF1"));
        tables
    }

    fn options(threshold: u64) -> ReconcileOptions {
        ReconcileOptions {
            threshold,
            top_n: 10,
        }
    }

    #[test]
    fn test_scenario_requested_dataset_in_index() {
        let counts = RequestCounts::from_pairs([("1", 5)]);
        let report = reconcile(&counts, &ids(&["1", "2"]), &scenario_tables(), &options(1));

        assert_eq!(report.sets.zero_request, ids(&["2"]));
        assert!(report.sets.missing_from_index.is_empty());
        assert!(report.sets.reindex_candidates.is_empty());
        assert!(report.reindex_candidates.is_empty());

        assert_eq!(report.zero_request.len(), 1);
        assert_eq!(report.zero_request[0].dataset_id, "2");
        assert_eq!(report.zero_request[0].request_count, Some(0));
        assert!(report.zero_request[0].domain.is_none());
    }

    #[test]
    fn test_scenario_missing_dataset_over_threshold() {
        let counts = RequestCounts::from_pairs([("3", 100)]);
        let report = reconcile(&counts, &BTreeSet::new(), &scenario_tables(), &options(50));

        assert_eq!(report.sets.missing_from_index, ids(&["3"]));
        assert_eq!(report.sets.reindex_candidates, ids(&["3"]));
        assert_eq!(report.reindex_candidates.len(), 1);
        assert_eq!(report.reindex_candidates[0].dataset_id, "3");
        assert_eq!(report.reindex_candidates[0].request_count, 100);
        assert!(report.reindex_candidates[0].fxf.is_none());
    }

    #[test]
    fn test_scenario_app_backed_zero_request_is_explained() {
        let mut tables = scenario_tables();
        dataset(&mut tables, "2", "wxyz-0002");
        app(&mut tables, "wxyz-0002");

        let counts = RequestCounts::from_pairs([("1", 5)]);
        let report = reconcile(&counts, &ids(&["1", "2"]), &tables, &options(1));

        assert!(report.sets.zero_request.contains("2"));
        assert!(!report.sets.zero_request_unexplained.contains("2"));
        assert_eq!(report.app_backed_zero_request(), ids(&["2"]));
        assert_eq!(
            report.zero_request[0].app_urls.as_deref(),
            Some("https://example.com/wxyz-0002")
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let counts = RequestCounts::from_pairs([("a", 50), ("b", 51), ("c", 49)]);
        let report = reconcile(&counts, &BTreeSet::new(), &ReferenceTables::default(), &options(50));

        assert_eq!(report.sets.reindex_candidates, ids(&["b"]));
        assert!(report
            .reindex_candidates
            .iter()
            .all(|candidate| candidate.request_count > 50));
    }

    #[test]
    fn test_sets_partition_union() {
        let counts = RequestCounts::from_pairs([("a", 1), ("b", 2), ("c", 3)]);
        let indexed = ids(&["b", "c", "d", "e"]);
        let sets = ReconciliationSets::compute(&counts, &indexed, &ReferenceTables::default(), 0);

        let both: BTreeSet<String> = sets.indexed.intersection(&sets.requested).cloned().collect();
        assert!(sets.zero_request.is_disjoint(&sets.missing_from_index));
        assert!(sets.zero_request.is_disjoint(&both));
        assert!(sets.missing_from_index.is_disjoint(&both));

        let mut rebuilt = sets.zero_request.clone();
        rebuilt.extend(sets.missing_from_index.iter().cloned());
        rebuilt.extend(both);
        let union: BTreeSet<String> = sets.indexed.union(&sets.requested).cloned().collect();
        assert_eq!(rebuilt, union);
        assert!(sets.reindex_candidates.is_subset(&sets.missing_from_index));
    }

    #[test]
    fn test_top_datasets_ordering() {
        let mut tables = ReferenceTables::default();
        dataset(&mut tables, "b", "bbbb-bbbb");
        let counts = RequestCounts::from_pairs([("c", 5), ("b", 7), ("a", 7), ("d", 1)]);

        let top = top_datasets(&counts, &tables, 3);
        let order: Vec<&str> = top.iter().map(|t| t.dataset_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(top[1].fxf.as_deref(), Some("bbbb-bbbb"));
        assert!(top[0].fxf.is_none());
    }

    #[test]
    fn test_domain_distribution_with_unknown_bucket() {
        let mut tables = ReferenceTables::default();
        for (id, fxf) in [("1", "aaaa-0001"), ("2", "aaaa-0002"), ("3", "bbbb-0003")] {
            dataset(&mut tables, id, fxf);
        }
        domain(&mut tables, "aaaa-0001", "a.example.com", None);
        domain(&mut tables, "aaaa-0002", "a.example.com", None);
        domain(&mut tables, "bbbb-0003", "b.example.com", None);

        let indexed = ids(&["1", "2", "3", "4"]);
        let report = reconcile(&RequestCounts::new(), &indexed, &tables, &options(0));

        assert_eq!(
            report.domain_distribution,
            vec![
                DomainCount {
                    domain: DomainBucket::Known("a.example.com".to_string()),
                    dataset_count: 2
                },
                DomainCount {
                    domain: DomainBucket::Known("b.example.com".to_string()),
                    dataset_count: 1
                },
                DomainCount {
                    domain: DomainBucket::Unknown,
                    dataset_count: 1
                },
            ]
        );
        assert_eq!(report.non_customer_indexed, 3);
    }

    #[test]
    fn test_reindex_candidates_sorted_by_count() {
        let counts = RequestCounts::from_pairs([("x", 20), ("y", 30), ("w", 20)]);
        let report = reconcile(&counts, &BTreeSet::new(), &ReferenceTables::default(), &options(10));
        let order: Vec<&str> = report
            .reindex_candidates
            .iter()
            .map(|c| c.dataset_id.as_str())
            .collect();
        assert_eq!(order, vec!["y", "w", "x"]);
    }

    #[test]
    fn test_empty_inputs() {
        let report = reconcile(
            &RequestCounts::new(),
            &BTreeSet::new(),
            &ReferenceTables::default(),
            &ReconcileOptions::default(),
        );
        assert_eq!(report.indexed_count(), 0);
        assert_eq!(report.requested_count(), 0);
        assert_eq!(report.total_requests, 0);
        assert!(report.top_datasets.is_empty());
        assert!(report.domain_distribution.is_empty());

        // No logs at all: every indexed dataset is zero-request
        let report = reconcile(
            &RequestCounts::new(),
            &ids(&["1", "2"]),
            &ReferenceTables::default(),
            &ReconcileOptions::default(),
        );
        assert_eq!(report.sets.zero_request, ids(&["1", "2"]));
        assert_eq!(report.sets.zero_request_unexplained, ids(&["1", "2"]));
    }
}
