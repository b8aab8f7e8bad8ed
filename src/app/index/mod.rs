//! Search index contents
//!
//! Reconciliation only needs the set of dataset IDs present in the index. The
//! set comes either from a flat snapshot file or from a live scroll over the
//! index, and both sources yield the same `BTreeSet<String>`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spandex_usage::app::index::{IndexClientConfig, IndexSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = IndexSource::Remote(IndexClientConfig::for_host("search.internal", 9200));
//! let indexed = source.dataset_ids().await?;
//! println!("{} datasets in the index", indexed.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod snapshot;

use std::collections::BTreeSet;
use std::path::PathBuf;

pub use client::{ScrollPage, SearchIndexClient};
pub use config::IndexClientConfig;
pub use snapshot::{parse_index_snapshot, read_index_snapshot};

use crate::errors::IndexResult;

/// Where the indexed dataset IDs come from
#[derive(Debug, Clone)]
pub enum IndexSource {
    /// Newline separated dataset IDs in a file
    Snapshot(PathBuf),
    /// Live scroll over the search index
    Remote(IndexClientConfig),
}

impl IndexSource {
    /// Resolve the set of indexed dataset IDs
    pub async fn dataset_ids(&self) -> IndexResult<BTreeSet<String>> {
        match self {
            Self::Snapshot(path) => read_index_snapshot(path).await,
            Self::Remote(config) => SearchIndexClient::new(config.clone())?.dataset_ids().await,
        }
    }

    /// Short description for progress messages
    pub fn describe(&self) -> String {
        match self {
            Self::Snapshot(path) => format!("snapshot {}", path.display()),
            Self::Remote(config) => format!("search index {}:{}", config.host, config.port),
        }
    }
}
