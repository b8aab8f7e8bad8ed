//! Request log parsing and streaming
//!
//! This module turns suggest-endpoint request logs into structured records.
//! Two input shapes are supported:
//!
//! - **JSON lines** exported from the log search API, one message per line with
//!   `_raw` (the request line) and `_messagetime` fields;
//! - **counted logs**, pre-aggregated `count dataset_id` pairs.
//!
//! A message that cannot be parsed never aborts a run. It is reported as
//! [`ParseOutcome::Skipped`] and counted in [`LogStats`].
//!
//! # Module Organization
//!
//! - [`types`] - Raw message, record, parse outcome and statistics types
//! - [`parser`] - Request line grammar, query string and message time decoding
//! - [`streaming`] - Line-by-line JSON-lines streamer
//! - [`counts`] - Pre-aggregated count file reader
//! - [`utils`] - Folding log files into counts or enriched records

pub mod counts;
pub mod parser;
pub mod streaming;
pub mod types;
pub mod utils;

pub use counts::{parse_counted_logs, read_counted_logs};
pub use parser::{
    decode_message_time, parse_log_line, parse_log_record, parse_query_string,
    parse_request_line, RequestParts,
};
pub use streaming::LogStreamer;
pub use types::{LogRecord, LogStats, ParseOutcome, QueryParams, RawLogMessage, SkipReason};
pub use utils::{count_requests, extract_enriched_records};
