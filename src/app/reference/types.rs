//! Core types for reference table processing
//!
//! This module contains the record types built from the three tab-delimited
//! reference tables, plus the read-only bundle that the join engine consumes.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Timestamp column from a reference table, kept verbatim
///
/// Reference exports are not consistent about timestamp formats, and only the
/// presence of some columns (e.g. `deleted_at`) carries meaning, so the raw
/// text is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTimestamp(String);

impl ReferenceTimestamp {
    /// Wrap a raw timestamp column value
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl std::fmt::Display for ReferenceTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the dataset table: `dataset_id, fxf, version[, created_at]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReference {
    /// Dataset system ID (e.g. "alpha.1234")
    pub dataset_id: String,
    /// FXF of the dataset, the join key into the domain and app tables
    pub fxf: Option<String>,
    /// Dataset copy version
    pub version: Option<String>,
    /// Approximate insertion time into the index
    pub created_at: Option<ReferenceTimestamp>,
}

/// One row of the domain table: `fxf, cname, salesforce_id, deleted_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// FXF this row describes
    pub fxf: String,
    /// Hosting domain cname
    pub cname: Option<String>,
    /// Salesforce account ID of the domain owner
    pub salesforce_id: Option<String>,
    /// When the domain was deleted
    pub deleted_at: Option<ReferenceTimestamp>,
}

impl DomainInfo {
    /// Whether the hosting domain looks like a paying customer's domain
    ///
    /// True when the domain has a Salesforce account and has not been deleted.
    /// These two columns are not a perfect indicator: internal and demo domains
    /// can carry a Salesforce ID too. Treat the result as a heuristic.
    pub fn is_customer_domain(&self) -> bool {
        let has_salesforce_id = self
            .salesforce_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        has_salesforce_id && self.deleted_at.is_none()
    }
}

/// One row of the app-backing table: `fxf, domain, app_type, app_urls`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppBackingInfo {
    /// FXF of the dataset backing the app
    pub fxf: String,
    /// Domain the app lives on
    pub domain: String,
    /// App type (e.g. "open_budget")
    pub app_type: String,
    /// App URLs as exported, comma separated
    pub app_urls: String,
}

/// Dataset table keyed by dataset ID
pub type DatasetReferenceMap = HashMap<String, DatasetReference>;

/// Domain table keyed by FXF
pub type DomainInfoMap = HashMap<String, DomainInfo>;

/// App-backing table keyed by FXF
pub type AppBackingInfoMap = HashMap<String, AppBackingInfo>;

/// Locations of the three reference tables
#[derive(Debug, Clone)]
pub struct ReferencePaths {
    /// Tab-delimited file mapping dataset IDs to FXFs
    pub dataset_id_fxf_map: PathBuf,
    /// Tab-delimited file mapping FXFs to domains
    pub fxf_domain_map: PathBuf,
    /// Tab-delimited file of FXFs backing downstream apps (optional for extraction)
    pub app_backing_map: Option<PathBuf>,
}

/// The three reference tables, loaded once per run and never mutated
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub datasets: DatasetReferenceMap,
    pub domains: DomainInfoMap,
    pub apps: AppBackingInfoMap,
}

impl ReferenceTables {
    /// Bundle already-built maps
    pub fn new(
        datasets: DatasetReferenceMap,
        domains: DomainInfoMap,
        apps: AppBackingInfoMap,
    ) -> Self {
        Self {
            datasets,
            domains,
            apps,
        }
    }

    /// Look up a dataset by system ID
    pub fn dataset(&self, dataset_id: &str) -> Option<&DatasetReference> {
        self.datasets.get(dataset_id)
    }

    /// FXF of a dataset, if the dataset is known and has one
    pub fn fxf_for(&self, dataset_id: &str) -> Option<&str> {
        self.dataset(dataset_id)?.fxf.as_deref()
    }

    /// Look up domain metadata by FXF
    pub fn domain(&self, fxf: &str) -> Option<&DomainInfo> {
        self.domains.get(fxf)
    }

    /// Look up app-backing metadata by FXF
    pub fn app(&self, fxf: &str) -> Option<&AppBackingInfo> {
        self.apps.get(fxf)
    }

    /// Whether the dataset's FXF backs a known downstream app
    pub fn is_app_backed(&self, dataset_id: &str) -> bool {
        self.fxf_for(dataset_id)
            .is_some_and(|fxf| self.apps.contains_key(fxf))
    }
}
