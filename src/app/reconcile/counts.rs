//! Per-dataset request counting

use std::collections::{BTreeMap, BTreeSet};

use crate::app::join::{join_metadata, EnrichedRecord};
use crate::app::logs::LogRecord;
use crate::app::reference::ReferenceTables;

/// Number of observed suggest requests per dataset ID
///
/// Only datasets with at least one request are present, so the key set is
/// exactly the set of requested datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCounts {
    counts: BTreeMap<String, u64>,
}

impl RequestCounts {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for a dataset
    pub fn record(&mut self, dataset_id: &str) {
        self.add(dataset_id, 1);
    }

    /// Add `count` requests for a dataset; zero is ignored
    pub fn add(&mut self, dataset_id: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(dataset_id.to_string()).or_insert(0) += count;
    }

    /// Build from `(dataset_id, count)` pairs, summing repeated IDs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut counts = Self::new();
        for (dataset_id, count) in pairs {
            counts.add(dataset_id.as_ref(), count);
        }
        counts
    }

    /// Count parsed log records
    pub fn from_log_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let mut counts = Self::new();
        for record in records {
            counts.record(&record.dataset_id);
        }
        counts
    }

    /// Recover counts from a stored enriched dataset
    ///
    /// Aggregate rows contribute their `request_count`; per-request rows (no
    /// count, but a request time) contribute one each.
    pub fn from_enriched_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EnrichedRecord>,
    {
        let mut counts = Self::new();
        for record in records {
            match record.request_count {
                Some(count) => counts.add(&record.dataset_id, count),
                None if record.messagetime.is_some() => counts.record(&record.dataset_id),
                None => {}
            }
        }
        counts
    }

    /// Requests observed for a dataset (zero when never requested)
    pub fn get(&self, dataset_id: &str) -> u64 {
        self.counts.get(dataset_id).copied().unwrap_or(0)
    }

    /// Whether the dataset was requested at least once
    pub fn contains(&self, dataset_id: &str) -> bool {
        self.counts.contains_key(dataset_id)
    }

    /// Iterate `(dataset_id, count)` in dataset ID order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    /// The set of requested dataset IDs
    pub fn requested(&self) -> BTreeSet<String> {
        self.counts.keys().cloned().collect()
    }

    /// Number of distinct requested datasets
    pub fn distinct_datasets(&self) -> usize {
        self.counts.len()
    }

    /// Total number of requests
    pub fn total_requests(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Whether no requests were observed
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// One enriched aggregate row per requested dataset, in dataset ID order
    pub fn enrich(&self, tables: &ReferenceTables) -> Vec<EnrichedRecord> {
        self.iter()
            .map(|(dataset_id, count)| join_metadata(dataset_id, Some(count), tables))
            .collect()
    }

    /// Fold another counter into this one
    pub fn merge(&mut self, other: &RequestCounts) {
        for (dataset_id, count) in other.iter() {
            self.add(dataset_id, count);
        }
    }
}
