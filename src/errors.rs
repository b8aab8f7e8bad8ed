//! Error types for spandex_usage
//!
//! This module defines the error types for every stage of the reconciliation
//! run. Errors are designed to be actionable: each carries the file, line, or
//! endpoint that caused it so a failed batch run can be fixed without guessing.
//!
//! Lookup misses during the metadata join and unparseable request lines are
//! deliberately *not* errors; see [`crate::app::join`] and
//! [`crate::app::logs::ParseOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Reference table loading errors
#[derive(Error, Debug)]
pub enum ReferenceError {
    /// Reference file could not be read
    #[error("Failed to read reference file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row does not have the field count its table requires
    #[error(
        "Malformed reference row in {path} at line {line}: expected {expected} tab-separated fields, found {found}"
    )]
    MalformedRow {
        path: PathBuf,
        line: usize,
        expected: String,
        found: usize,
    },
}

/// Request log reading errors
#[derive(Error, Debug)]
pub enum LogError {
    /// Log file not found
    #[error("Log file not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O error reading a log file
    #[error("I/O error reading request logs {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid line in a pre-aggregated count file
    #[error("Invalid counted log line {line}: {content}")]
    InvalidCountLine { line: usize, content: String },

    /// Stored enriched dataset could not be decoded
    #[error("Invalid enriched dataset record at line {line}")]
    InvalidDatasetRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Search index snapshot errors
#[derive(Error, Debug)]
pub enum IndexError {
    /// I/O error reading an index snapshot file
    #[error("I/O error reading index snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request to the search index failed
    #[error("Search index request failed")]
    Http(#[from] reqwest::Error),

    /// Invalid search index URL
    #[error("Invalid search index URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Search index returned an error status
    #[error("Search index error: HTTP {status}")]
    ServerError { status: u16 },

    /// Search index asked us to back off more times than we retry
    #[error("Search index rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Search index is overloaded
    #[error("Search index overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for search index request")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Response body did not have the expected shape
    #[error("Unexpected search index response: {reason}")]
    UnexpectedResponse { reason: String },
}

/// Report and output writing errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// I/O error writing a report
    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of an enriched record failed
    #[error("Failed to serialize enriched record")]
    Serialize(#[from] serde_json::Error),

    /// Atomic rename of a finished report failed
    #[error("Atomic file operation failed: could not persist {path}: {source}")]
    AtomicOperationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Configuration file I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("Failed to render configuration")]
    Render(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Could not determine the user configuration directory
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Reference table error
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Request log error
    #[error(transparent)]
    Log(#[from] LogError),

    /// Index snapshot error
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Report error
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Index(IndexError::Http(_))
                | AppError::Index(IndexError::RateLimitExceeded)
                | AppError::Index(IndexError::ServerOverloaded)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Reference(_) => "reference",
            AppError::Log(_) => "logs",
            AppError::Index(_) => "index",
            AppError::Report(_) => "report",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Reference table result type alias
pub type ReferenceResult<T> = std::result::Result<T, ReferenceError>;

/// Request log result type alias
pub type LogResult<T> = std::result::Result<T, LogError>;

/// Index snapshot result type alias
pub type IndexResult<T> = std::result::Result<T, IndexError>;

/// Report result type alias
pub type ReportResult<T> = std::result::Result<T, ReportError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_row_message() {
        let err = ReferenceError::MalformedRow {
            path: PathBuf::from("apps.tsv"),
            line: 3,
            expected: "exactly 4".to_string(),
            found: 2,
        };
        let message = err.to_string();
        assert!(message.contains("apps.tsv"));
        assert!(message.contains("line 3"));
        assert!(message.contains("found 2"));
    }

    #[test]
    fn test_io_messages_name_file_and_cause() {
        let err = LogError::Io {
            path: PathBuf::from("week1.logs.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        let message = AppError::from(err).to_string();
        assert!(message.contains("week1.logs.json"));
        assert!(message.contains("access denied"));
    }

    #[test]
    fn test_categories_and_recoverability() {
        let app_error = AppError::from(IndexError::ServerOverloaded);
        assert_eq!(app_error.category(), "index");
        assert!(app_error.is_recoverable());

        let app_error = AppError::from(ReferenceError::MalformedRow {
            path: PathBuf::from("domains.tsv"),
            line: 1,
            expected: "at most 4".to_string(),
            found: 6,
        });
        assert_eq!(app_error.category(), "reference");
        assert!(!app_error.is_recoverable());
    }
}
