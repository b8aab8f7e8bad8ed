//! Metadata join engine
//!
//! Combines a dataset ID with the three reference tables into one flat
//! [`EnrichedRecord`]. The dataset table resolves the FXF, and the FXF alone
//! is then used to reach the domain and app-backing tables.
//!
//! The join never fails. Reference data is routinely incomplete (datasets
//! created after the export, FXFs deleted downstream), so every lookup miss
//! leaves the affected fields `None` instead of inventing a value.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::logs::{LogRecord, QueryParams};
use crate::app::reference::{ReferenceTables, ReferenceTimestamp};

/// A dataset ID with everything the reference tables know about it
///
/// Carries either an aggregate `request_count` (reconciliation) or the details
/// of a single request (extraction), never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub dataset_id: String,
    pub fxf: Option<String>,
    pub version: Option<String>,
    pub created_at: Option<ReferenceTimestamp>,
    /// Domain cname
    pub domain: Option<String>,
    pub salesforce_id: Option<String>,
    pub domain_deleted_at: Option<ReferenceTimestamp>,
    /// `None` when no domain row was reached; see
    /// [`DomainInfo::is_customer_domain`](crate::app::reference::DomainInfo::is_customer_domain)
    pub is_customer_domain: Option<bool>,
    /// URLs of downstream apps backed by this dataset
    pub app_urls: Option<String>,
    pub request_count: Option<u64>,
    pub messagetime: Option<DateTime<Local>>,
    pub pub_stage: Option<String>,
    pub column_id: Option<String>,
    pub query_params: Option<QueryParams>,
}

impl EnrichedRecord {
    /// Whether the dataset backs a known downstream app
    pub fn is_app_backed(&self) -> bool {
        self.app_urls.is_some()
    }
}

/// Join a dataset ID (and optional request count) with the reference tables
///
/// Pure: identical inputs always give identical output and the tables are only
/// read.
pub fn join_metadata(
    dataset_id: &str,
    request_count: Option<u64>,
    tables: &ReferenceTables,
) -> EnrichedRecord {
    let dataset = tables.dataset(dataset_id);
    let fxf = dataset.and_then(|d| d.fxf.as_deref());
    let domain = fxf.and_then(|fxf| tables.domain(fxf));
    let app = fxf.and_then(|fxf| tables.app(fxf));

    EnrichedRecord {
        dataset_id: dataset_id.to_string(),
        fxf: fxf.map(str::to_string),
        version: dataset.and_then(|d| d.version.clone()),
        created_at: dataset.and_then(|d| d.created_at.clone()),
        domain: domain.and_then(|d| d.cname.clone()),
        salesforce_id: domain.and_then(|d| d.salesforce_id.clone()),
        domain_deleted_at: domain.and_then(|d| d.deleted_at.clone()),
        is_customer_domain: domain.map(|d| d.is_customer_domain()),
        app_urls: app.map(|a| a.app_urls.clone()),
        request_count,
        messagetime: None,
        pub_stage: None,
        column_id: None,
        query_params: None,
    }
}

/// Join a single parsed request with the reference tables
pub fn enrich_log_record(record: LogRecord, tables: &ReferenceTables) -> EnrichedRecord {
    EnrichedRecord {
        messagetime: Some(record.timestamp),
        pub_stage: Some(record.pub_stage),
        column_id: Some(record.column_id),
        query_params: Some(record.query_params),
        ..join_metadata(&record.dataset_id, None, tables)
    }
}
