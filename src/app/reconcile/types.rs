//! Core types for reconciliation results

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::counts::RequestCounts;
use crate::app::join::EnrichedRecord;
use crate::constants::reconcile::{
    DEFAULT_REINDEX_THRESHOLD, DEFAULT_TOP_N, UNKNOWN_DOMAIN_LABEL,
};

/// Tunables for a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// A missing dataset needs strictly more requests than this to be a
    /// re-index candidate
    pub threshold: u64,
    /// Rows kept in the top datasets table
    pub top_n: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REINDEX_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Dataset ID sets derived from the index, the logs, and the app table
///
/// Every set is plain set algebra over dataset ID strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationSets {
    /// Datasets currently in the index
    pub indexed: BTreeSet<String>,
    /// Datasets with at least one request
    pub requested: BTreeSet<String>,
    /// `indexed - requested`
    pub zero_request: BTreeSet<String>,
    /// `requested - indexed`
    pub missing_from_index: BTreeSet<String>,
    /// Datasets in `indexed | requested` whose FXF backs a downstream app
    pub app_backed: BTreeSet<String>,
    /// `zero_request - app_backed`
    pub zero_request_unexplained: BTreeSet<String>,
    /// Members of `missing_from_index` requested more than the threshold
    pub reindex_candidates: BTreeSet<String>,
}

/// One row of the top datasets table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopDataset {
    pub dataset_id: String,
    pub fxf: Option<String>,
    pub request_count: u64,
}

/// Grouping key for the zero-request domain distribution
///
/// Datasets with no resolved domain fall in `Unknown`, which sorts after every
/// known domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DomainBucket {
    Known(String),
    Unknown,
}

impl DomainBucket {
    /// Bucket for an optional domain
    pub fn from_domain(domain: Option<&str>) -> Self {
        match domain {
            Some(domain) => Self::Known(domain.to_string()),
            None => Self::Unknown,
        }
    }
}

impl std::fmt::Display for DomainBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(domain) => write!(f, "{}", domain),
            Self::Unknown => write!(f, "{}", UNKNOWN_DOMAIN_LABEL),
        }
    }
}

/// Number of zero-request datasets on one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: DomainBucket,
    pub dataset_count: usize,
}

/// A missing dataset that is requested often enough to consider re-indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexCandidate {
    pub domain: Option<String>,
    pub fxf: Option<String>,
    pub dataset_id: String,
    pub request_count: u64,
    pub app_urls: Option<String>,
}

impl From<&EnrichedRecord> for ReindexCandidate {
    fn from(record: &EnrichedRecord) -> Self {
        Self {
            domain: record.domain.clone(),
            fxf: record.fxf.clone(),
            dataset_id: record.dataset_id.clone(),
            request_count: record.request_count.unwrap_or(0),
            app_urls: record.app_urls.clone(),
        }
    }
}

/// Everything a reconciliation run reports
#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    /// Options the report was computed with
    pub options: ReconcileOptions,
    /// Derived dataset ID sets
    pub sets: ReconciliationSets,
    /// Requests per dataset, as given
    pub request_counts: RequestCounts,
    /// Total requests observed
    pub total_requests: u64,
    /// Most requested datasets, count descending then dataset ID ascending
    pub top_datasets: Vec<TopDataset>,
    /// Zero-request datasets, enriched with a count of 0, by dataset ID
    pub zero_request: Vec<EnrichedRecord>,
    /// Zero-request datasets per domain, count descending then domain ascending
    pub domain_distribution: Vec<DomainCount>,
    /// Requested datasets missing from the index, enriched, by dataset ID
    pub missing_from_index: Vec<EnrichedRecord>,
    /// Re-index candidates, count descending then dataset ID ascending
    pub reindex_candidates: Vec<ReindexCandidate>,
    /// Indexed datasets on a known domain that is not a customer domain
    pub non_customer_indexed: usize,
    /// Log lines skipped while building the counts
    pub skipped_log_lines: usize,
}

impl ReconciliationReport {
    /// Number of datasets in the index
    pub fn indexed_count(&self) -> usize {
        self.sets.indexed.len()
    }

    /// Number of distinct requested datasets
    pub fn requested_count(&self) -> usize {
        self.sets.requested.len()
    }

    /// Zero-request datasets that back a downstream app
    pub fn app_backed_zero_request(&self) -> BTreeSet<String> {
        self.sets
            .zero_request
            .intersection(&self.sets.app_backed)
            .cloned()
            .collect()
    }

    /// Attach the number of skipped log lines
    pub fn with_skipped_log_lines(mut self, skipped: usize) -> Self {
        self.skipped_log_lines = skipped;
        self
    }
}
