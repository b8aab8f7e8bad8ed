//! Reference table loading
//!
//! Three tab-delimited tables describe the datasets seen in the index and in
//! the request logs:
//!
//! - the **dataset table** maps a dataset system ID to its FXF, copy version,
//!   and creation time;
//! - the **domain table** maps an FXF to the hosting domain and its account
//!   metadata;
//! - the **app-backing table** lists FXFs that power downstream applications
//!   and are expected to receive little direct search traffic.
//!
//! The FXF is the only join key between the tables.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use spandex_usage::app::reference::{ReferencePaths, ReferenceTables};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = ReferencePaths {
//!     dataset_id_fxf_map: PathBuf::from("dataset_fxfs.tsv"),
//!     fxf_domain_map: PathBuf::from("fxf_domains.tsv"),
//!     app_backing_map: Some(PathBuf::from("app_fxfs.tsv")),
//! };
//! let tables = ReferenceTables::load(&paths).await?;
//! println!("{} datasets known", tables.datasets.len());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod types;

pub use loader::{
    load_app_backing_info, load_dataset_reference, load_domain_info, parse_app_backing_info,
    parse_dataset_reference, parse_domain_info,
};
pub use types::{
    AppBackingInfo, AppBackingInfoMap, DatasetReference, DatasetReferenceMap, DomainInfo,
    DomainInfoMap, ReferencePaths, ReferenceTables, ReferenceTimestamp,
};
