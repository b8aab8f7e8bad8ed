//! Configuration management for spandex_usage
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{IndexClientConfig, ReconcileOptions};
use crate::constants::{env, files, index, logging, reconcile};
use crate::errors::{ConfigError, ConfigResult};

/// Log levels accepted in `[logging]`
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Reconciliation settings
    pub reconcile: ReconcileConfigToml,
    /// Search index connection settings
    pub index: IndexConfigToml,
    /// Output file locations
    pub output: OutputConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly reconciliation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfigToml {
    /// Requests a missing dataset must exceed to be a re-index candidate
    pub threshold: u64,
    /// Rows shown in the top datasets and domain tables
    pub top_n: usize,
}

impl Default for ReconcileConfigToml {
    fn default() -> Self {
        Self {
            threshold: reconcile::DEFAULT_REINDEX_THRESHOLD,
            top_n: reconcile::DEFAULT_TOP_N,
        }
    }
}

/// TOML-friendly search index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfigToml {
    /// Search index host (None = use a snapshot file)
    pub host: Option<String>,
    /// Search index port
    pub port: u16,
    /// Index name (empty = every index)
    pub index: String,
    /// Document type holding dataset copies
    pub doc_type: String,
    /// Documents per scroll page
    pub scroll_page_size: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for IndexConfigToml {
    fn default() -> Self {
        Self {
            host: None,
            port: index::DEFAULT_PORT,
            index: index::DEFAULT_INDEX.to_string(),
            doc_type: index::DATASET_COPY_DOC_TYPE.to_string(),
            scroll_page_size: index::SCROLL_PAGE_SIZE,
            request_timeout_secs: index::REQUEST_TIMEOUT.as_secs(),
            connect_timeout_secs: index::CONNECT_TIMEOUT.as_secs(),
        }
    }
}

/// TOML-friendly output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfigToml {
    /// Unexplained zero-request dataset list
    pub zero_request_datasets: PathBuf,
    /// HTML re-index report
    pub non_indexed: PathBuf,
    /// Stored enriched dataset
    pub enriched_dataset: PathBuf,
}

impl Default for OutputConfigToml {
    fn default() -> Self {
        Self {
            zero_request_datasets: PathBuf::from(files::ZERO_REQUEST_DATASETS_FILE),
            non_indexed: PathBuf::from(files::NON_INDEXED_FILE),
            enriched_dataset: PathBuf::from(files::ENRICHED_DATASET_FILE),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ReconcileConfigToml {
    /// Convert to runtime ReconcileOptions
    pub fn to_runtime_config(&self) -> ReconcileOptions {
        ReconcileOptions {
            threshold: self.threshold,
            top_n: self.top_n,
        }
    }
}

impl IndexConfigToml {
    /// Convert to a runtime client config for `host`
    pub fn to_runtime_config(&self, host: &str) -> IndexClientConfig {
        IndexClientConfig {
            host: host.to_string(),
            port: self.port,
            index: self.index.clone(),
            doc_type: self.doc_type.clone(),
            scroll_page_size: self.scroll_page_size,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied on top by the command handlers.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => Self::load_from_file(&path).await?,
            Some(path) if config_file_override.is_some() => {
                return Err(ConfigError::NotFound { path });
            }
            _ => Self::default(),
        };

        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SPANDEX_ES_HOST` and `SPANDEX_ES_PORT` from `lookup`
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::ES_HOST).filter(|h| !h.trim().is_empty()) {
            debug!("Search index host from {}", env::ES_HOST);
            self.index.host = Some(host.trim().to_string());
        }

        if let Some(port) = lookup(env::ES_PORT).filter(|p| !p.trim().is_empty()) {
            self.index.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: env::ES_PORT.to_string(),
                    value: port.clone(),
                    reason: "Expected a port number".to_string(),
                })?;
            debug!("Search index port from {}", env::ES_PORT);
        }

        Ok(())
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> ConfigResult<()> {
        if self.reconcile.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconcile.top_n".to_string(),
                value: "0".to_string(),
                reason: "At least one row must be shown".to_string(),
            });
        }

        if self.index.scroll_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.scroll_page_size".to_string(),
                value: "0".to_string(),
                reason: "Scroll pages must hold at least one document".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Write a default config file, leaving an existing one untouched
    ///
    /// Returns the path and whether a file was created.
    pub async fn init(path_override: Option<PathBuf>) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path_override {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        Ok((config_path, true))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Ok(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# spandex-usage configuration
# Every setting is optional; missing values fall back to these defaults.

[reconcile]
# Requests a dataset missing from the index must exceed to be reported
threshold = {threshold}
# Rows shown in the top datasets and zero-request domain tables
top_n = {top_n}

[index]
# Search index to scroll when no snapshot file is given.
# Also settable with {env_host} and {env_port}.
# host = "localhost"
port = {port}
index = "{index}"
doc_type = "{doc_type}"
scroll_page_size = {page}
request_timeout_secs = {request_timeout}
connect_timeout_secs = {connect_timeout}

[output]
zero_request_datasets = "{zero_request}"
non_indexed = "{non_indexed}"
enriched_dataset = "{enriched}"

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            threshold = reconcile::DEFAULT_REINDEX_THRESHOLD,
            top_n = reconcile::DEFAULT_TOP_N,
            env_host = env::ES_HOST,
            env_port = env::ES_PORT,
            port = index::DEFAULT_PORT,
            index = index::DEFAULT_INDEX,
            doc_type = index::DATASET_COPY_DOC_TYPE,
            page = index::SCROLL_PAGE_SIZE,
            request_timeout = index::REQUEST_TIMEOUT.as_secs(),
            connect_timeout = index::CONNECT_TIMEOUT.as_secs(),
            zero_request = files::ZERO_REQUEST_DATASETS_FILE,
            non_indexed = files::NON_INDEXED_FILE,
            enriched = files::ENRICHED_DATASET_FILE,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.reconcile.threshold, 1000);
        assert_eq!(config.reconcile.top_n, 50);
        assert_eq!(config.logging.level, "warn");
        assert!(config.index.host.is_none());
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML matching the defaults
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, AppConfig::default());
        assert!(content.contains("[reconcile]"));
        assert!(content.contains(env::ES_HOST));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        // Should fail when explicitly specified
        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        tokio::fs::write(
            &config_path,
            "[reconcile]\nthreshold = 250\n\n[index]\nhost = \"search.internal\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.reconcile.threshold, 250);
        assert_eq!(config.reconcile.top_n, 50);
        assert_eq!(config.index.host.as_deref(), Some("search.internal"));
        assert_eq!(config.index.port, 9200);
    }

    #[tokio::test]
    async fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[reconcile\nthreshold = ")
            .await
            .unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(env::ES_HOST, "es.internal"), (env::ES_PORT, "9300")]);
        let mut config = AppConfig::default();
        config
            .apply_env_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.index.host.as_deref(), Some("es.internal"));
        assert_eq!(config.index.port, 9300);
    }

    #[test]
    fn test_invalid_env_port() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides_from(|key| {
            (key == env::ES_PORT).then(|| "ninety".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.reconcile.top_n = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_init_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let (path, created) = AppConfig::init(Some(config_path.clone())).await.unwrap();
        assert!(created);
        assert_eq!(path, config_path);

        tokio::fs::write(&config_path, "[logging]\nlevel = \"warn\"\n")
            .await
            .unwrap();
        let (_, created) = AppConfig::init(Some(config_path.clone())).await.unwrap();
        assert!(!created);

        let config = AppConfig::load(Some(config_path)).await.unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_runtime_conversion() {
        let config = AppConfig::default();
        let options = config.reconcile.to_runtime_config();
        assert_eq!(options, ReconcileOptions::default());

        let client = config.index.to_runtime_config("search.internal");
        assert_eq!(client.host, "search.internal");
        assert_eq!(client.request_timeout, index::REQUEST_TIMEOUT);
        assert!(config.to_toml().unwrap().contains("[reconcile]"));
    }
}
