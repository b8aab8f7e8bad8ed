//! Application constants for spandex_usage
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Search index host, used when `--es-host` is not given
    pub const ES_HOST: &str = "SPANDEX_ES_HOST";

    /// Search index port, used when `--es-port` is not given
    pub const ES_PORT: &str = "SPANDEX_ES_PORT";
}

/// Request log grammar and decoding
pub mod logs {
    /// Pattern for the suggest endpoint request line
    pub const REQUEST_PATH_PATTERN: &str = concat!(
        r"GET /suggest/",
        r"(?P<dataset_id>alpha\.[0-9]+)/",
        r"(?P<pub_stage>[A-Za-z]+)/",
        r"(?P<column_id>[0-9a-z]{4}-[0-9a-z]{4})",
        r"(\?(?P<query_params>[^ ]+))?"
    );

    /// Leading characters of `_messagetime` holding the epoch seconds.
    /// The log source pads the value with trailing digits.
    pub const MESSAGE_TIME_EPOCH_CHARS: usize = 10;

    /// JSON field holding the raw request line
    pub const RAW_FIELD: &str = "_raw";

    /// JSON field holding the message timestamp
    pub const MESSAGE_TIME_FIELD: &str = "_messagetime";

    /// Lines between debug progress messages while streaming logs
    pub const PROGRESS_BATCH_SIZE: usize = 100_000;
}

/// Reconciliation defaults
pub mod reconcile {
    /// Request count a missing dataset must exceed to be a re-index candidate
    pub const DEFAULT_REINDEX_THRESHOLD: u64 = 1000;

    /// Rows shown in the top datasets and domain tables
    pub const DEFAULT_TOP_N: usize = 50;

    /// Label of the domain bucket for datasets without a resolved domain
    pub const UNKNOWN_DOMAIN_LABEL: &str = "(unknown)";
}

/// Search index client configuration
pub mod index {
    use super::Duration;

    /// Default search index host
    pub const DEFAULT_HOST: &str = "localhost";

    /// Default search index port
    pub const DEFAULT_PORT: u16 = 9200;

    /// Default index name (empty targets every index behind the alias)
    pub const DEFAULT_INDEX: &str = "spandex";

    /// Document type holding one document per indexed dataset copy
    pub const DATASET_COPY_DOC_TYPE: &str = "dataset_copy";

    /// Field carrying the dataset system ID
    pub const DATASET_ID_FIELD: &str = "dataset_id";

    /// Documents fetched per scroll page
    pub const SCROLL_PAGE_SIZE: usize = 1000;

    /// Scroll context keep-alive
    pub const SCROLL_KEEP_ALIVE: &str = "1m";

    /// Default HTTP request timeout
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default user agent for index requests
    pub const USER_AGENT: &str = concat!("spandex-usage/", env!("CARGO_PKG_VERSION"));
}

/// Retry configuration for the search index client
pub mod limits {
    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// Output file defaults
pub mod files {
    /// Default path of the unexplained zero-request dataset list
    pub const ZERO_REQUEST_DATASETS_FILE: &str = "zero_request_datasets";

    /// Default path of the re-index candidate report
    pub const NON_INDEXED_FILE: &str = "non_indexed_with_counts";

    /// Default path of the stored enriched dataset
    pub const ENRICHED_DATASET_FILE: &str = "spandex_logs.jsonl";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "spandex-usage.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "spandex-usage";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

// Re-export commonly used constants for convenience
pub use files::{ENRICHED_DATASET_FILE, NON_INDEXED_FILE, ZERO_REQUEST_DATASETS_FILE};
pub use index::USER_AGENT;
pub use limits::{MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use reconcile::{DEFAULT_REINDEX_THRESHOLD, DEFAULT_TOP_N};
