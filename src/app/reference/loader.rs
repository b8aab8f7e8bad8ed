//! Reference table loading
//!
//! Each table is a tab-delimited text file keyed by its first column. Files are
//! small compared with the request logs, so they are read fully into memory and
//! parsed in one pass. Blank lines are skipped everywhere; the field-count rule
//! differs per table:
//!
//! | table       | fields | short rows            | long rows |
//! |-------------|--------|-----------------------|-----------|
//! | dataset     | 1..=4  | trailing fields absent | error     |
//! | domain      | 1..=4  | padded with absent     | error     |
//! | app-backing | 4      | error                  | error     |

use std::path::Path;

use tracing::{debug, info};

use super::types::{
    AppBackingInfo, AppBackingInfoMap, DatasetReference, DatasetReferenceMap, DomainInfo,
    DomainInfoMap, ReferencePaths, ReferenceTables, ReferenceTimestamp,
};
use crate::errors::{ReferenceError, ReferenceResult};

/// Number of columns in every reference table
const REFERENCE_COLUMNS: usize = 4;

/// Non-blank rows of a reference file as `(line number, fields)`
fn rows(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content.lines().enumerate().filter_map(|(index, line)| {
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some((index + 1, line.split('\t').collect()))
        }
    })
}

/// Optional column value; empty strings count as absent
fn optional(fields: &[&str], index: usize) -> Option<String> {
    fields
        .get(index)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn too_many_fields(source: &Path, line: usize, found: usize) -> ReferenceError {
    ReferenceError::MalformedRow {
        path: source.to_path_buf(),
        line,
        expected: format!("at most {}", REFERENCE_COLUMNS),
        found,
    }
}

fn insert_logging_duplicates<V>(
    map: &mut std::collections::HashMap<String, V>,
    key: String,
    value: V,
    source: &Path,
) {
    if let Some(_previous) = map.insert(key.clone(), value) {
        debug!(
            "Duplicate key {} in {}, keeping the last row",
            key,
            source.display()
        );
    }
}

/// Parse the dataset table (`dataset_id, fxf, version[, created_at]`)
///
/// `source` is only used for error messages.
pub fn parse_dataset_reference(
    content: &str,
    source: &Path,
) -> ReferenceResult<DatasetReferenceMap> {
    let mut map = DatasetReferenceMap::new();

    for (line, fields) in rows(content) {
        if fields.len() > REFERENCE_COLUMNS {
            return Err(too_many_fields(source, line, fields.len()));
        }

        let reference = DatasetReference {
            dataset_id: fields[0].to_string(),
            fxf: optional(&fields, 1),
            version: optional(&fields, 2),
            created_at: optional(&fields, 3).map(ReferenceTimestamp::new),
        };
        insert_logging_duplicates(&mut map, reference.dataset_id.clone(), reference, source);
    }

    Ok(map)
}

/// Parse the domain table (`fxf, cname, salesforce_id, deleted_at`)
///
/// Short rows are padded to four fields with absent values.
pub fn parse_domain_info(content: &str, source: &Path) -> ReferenceResult<DomainInfoMap> {
    let mut map = DomainInfoMap::new();

    for (line, mut fields) in rows(content) {
        if fields.len() > REFERENCE_COLUMNS {
            return Err(too_many_fields(source, line, fields.len()));
        }
        fields.resize(REFERENCE_COLUMNS, "");

        let domain = DomainInfo {
            fxf: fields[0].to_string(),
            cname: optional(&fields, 1),
            salesforce_id: optional(&fields, 2),
            deleted_at: optional(&fields, 3).map(ReferenceTimestamp::new),
        };
        insert_logging_duplicates(&mut map, domain.fxf.clone(), domain, source);
    }

    Ok(map)
}

/// Parse the app-backing table (`fxf, domain, app_type, app_urls`)
///
/// # Errors
///
/// Returns `ReferenceError::MalformedRow` for any row without exactly four
/// fields. This table's completeness is assumed, so a bad row fails the run.
pub fn parse_app_backing_info(
    content: &str,
    source: &Path,
) -> ReferenceResult<AppBackingInfoMap> {
    let mut map = AppBackingInfoMap::new();

    for (line, fields) in rows(content) {
        let [fxf, domain, app_type, app_urls] = fields[..] else {
            return Err(ReferenceError::MalformedRow {
                path: source.to_path_buf(),
                line,
                expected: format!("exactly {}", REFERENCE_COLUMNS),
                found: fields.len(),
            });
        };

        let app = AppBackingInfo {
            fxf: fxf.to_string(),
            domain: domain.to_string(),
            app_type: app_type.to_string(),
            app_urls: app_urls.to_string(),
        };
        insert_logging_duplicates(&mut map, app.fxf.clone(), app, source);
    }

    Ok(map)
}

async fn read_reference_file(path: &Path) -> ReferenceResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load the dataset table from disk
pub async fn load_dataset_reference<P: AsRef<Path>>(
    path: P,
) -> ReferenceResult<DatasetReferenceMap> {
    let path = path.as_ref();
    let content = read_reference_file(path).await?;
    let map = parse_dataset_reference(&content, path)?;
    info!("Loaded {} dataset references from {}", map.len(), path.display());
    Ok(map)
}

/// Load the domain table from disk
pub async fn load_domain_info<P: AsRef<Path>>(path: P) -> ReferenceResult<DomainInfoMap> {
    let path = path.as_ref();
    let content = read_reference_file(path).await?;
    let map = parse_domain_info(&content, path)?;
    info!("Loaded {} domain rows from {}", map.len(), path.display());
    Ok(map)
}

/// Load the app-backing table from disk
pub async fn load_app_backing_info<P: AsRef<Path>>(path: P) -> ReferenceResult<AppBackingInfoMap> {
    let path = path.as_ref();
    let content = read_reference_file(path).await?;
    let map = parse_app_backing_info(&content, path)?;
    info!("Loaded {} app-backing rows from {}", map.len(), path.display());
    Ok(map)
}

impl ReferenceTables {
    /// Load all reference tables concurrently
    ///
    /// Without an app-backing path the app table is empty, so nothing is
    /// treated as app-backed.
    pub async fn load(paths: &ReferencePaths) -> ReferenceResult<Self> {
        let apps = async {
            match &paths.app_backing_map {
                Some(path) => load_app_backing_info(path).await,
                None => Ok(AppBackingInfoMap::new()),
            }
        };

        let (datasets, domains, apps) = tokio::try_join!(
            load_dataset_reference(&paths.dataset_id_fxf_map),
            load_domain_info(&paths.fxf_domain_map),
            apps,
        )?;

        Ok(Self::new(datasets, domains, apps))
    }
}
