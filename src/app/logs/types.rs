//! Core types for request log processing
//!
//! This module contains the raw message shape written by the log scraper, the
//! structured record extracted from it, the tagged parse outcome, and the
//! statistics gathered while streaming log files.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::constants::logs::PROGRESS_BATCH_SIZE;

/// Decoded query string: parameter name to values, in request order
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// One raw log message as exported by the log search API
///
/// Only the request line and the message time are used. The message time is
/// normally a string, but numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLogMessage {
    /// Raw request line text
    #[serde(rename = "_raw", default)]
    pub raw: Option<String>,
    /// Message time, epoch milliseconds padded by the log source
    #[serde(rename = "_messagetime", default)]
    pub message_time: Option<serde_json::Value>,
}

impl RawLogMessage {
    /// Build a message from its two string fields
    pub fn new(raw: impl Into<String>, message_time: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            message_time: Some(serde_json::Value::String(message_time.into())),
        }
    }

    /// Message time as text, whichever JSON type it arrived as
    pub fn message_time_text(&self) -> Option<String> {
        match self.message_time.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A suggest request extracted from one log message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Local time of the request
    pub timestamp: DateTime<Local>,
    /// Dataset system ID (e.g. "alpha.1234")
    pub dataset_id: String,
    /// Publication stage (e.g. "published")
    pub pub_stage: String,
    /// Column identifier (e.g. "abcd-1234")
    pub column_id: String,
    /// Decoded query parameters
    pub query_params: QueryParams,
}

/// Why a log message was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line is not valid UTF-8
    InvalidEncoding,
    /// The line is not valid JSON
    InvalidJson,
    /// A required field is absent or has the wrong type
    MissingField { field: &'static str },
    /// The message time does not start with epoch seconds
    InvalidMessageTime { value: String },
    /// The request line does not match the suggest grammar
    UnrecognizedRequest,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEncoding => write!(f, "invalid UTF-8"),
            Self::InvalidJson => write!(f, "invalid JSON"),
            Self::MissingField { field } => write!(f, "missing field {}", field),
            Self::InvalidMessageTime { value } => write!(f, "invalid message time {:?}", value),
            Self::UnrecognizedRequest => write!(f, "unrecognized request line"),
        }
    }
}

/// Result of parsing one log message
///
/// A skipped message is not an error: the caller counts it and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(LogRecord),
    Skipped(SkipReason),
}

impl ParseOutcome {
    /// The parsed record, if any
    pub fn into_record(self) -> Option<LogRecord> {
        match self {
            Self::Parsed(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }

    /// Whether the message was skipped
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Statistics about log processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Total lines read
    pub lines_processed: usize,
    /// Messages parsed into records
    pub parsed: usize,
    /// Blank lines ignored
    pub blank_lines: usize,
    /// Lines that were not valid UTF-8
    pub invalid_encodings: usize,
    /// Lines that were not JSON or lacked a field
    pub malformed_messages: usize,
    /// Messages with an undecodable message time
    pub invalid_message_times: usize,
    /// Messages whose request line did not match the grammar
    pub unrecognized_requests: usize,
    /// Lines between debug progress messages
    progress_batch_size: usize,
}

impl LogStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self {
            progress_batch_size: PROGRESS_BATCH_SIZE,
            ..Default::default()
        }
    }

    /// Record the outcome of one non-blank line
    pub fn record(&mut self, outcome: &ParseOutcome) {
        match outcome {
            ParseOutcome::Parsed(_) => self.parsed += 1,
            ParseOutcome::Skipped(SkipReason::InvalidEncoding) => self.invalid_encodings += 1,
            ParseOutcome::Skipped(SkipReason::InvalidJson)
            | ParseOutcome::Skipped(SkipReason::MissingField { .. }) => {
                self.malformed_messages += 1
            }
            ParseOutcome::Skipped(SkipReason::InvalidMessageTime { .. }) => {
                self.invalid_message_times += 1
            }
            ParseOutcome::Skipped(SkipReason::UnrecognizedRequest) => {
                self.unrecognized_requests += 1
            }
        }
    }

    /// Total skipped messages (blank lines excluded)
    pub fn skipped(&self) -> usize {
        self.invalid_encodings
            + self.malformed_messages
            + self.invalid_message_times
            + self.unrecognized_requests
    }

    /// Parse success rate over non-blank lines, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.parsed + self.skipped();
        if attempted == 0 {
            0.0
        } else {
            (self.parsed as f64 / attempted as f64) * 100.0
        }
    }

    /// Whether a progress message is due
    pub fn progress_due(&self) -> bool {
        self.progress_batch_size > 0 && self.lines_processed % self.progress_batch_size == 0
    }

    /// Fold another file's statistics into these
    pub fn merge(&mut self, other: &LogStats) {
        self.lines_processed += other.lines_processed;
        self.parsed += other.parsed;
        self.blank_lines += other.blank_lines;
        self.invalid_encodings += other.invalid_encodings;
        self.malformed_messages += other.malformed_messages;
        self.invalid_message_times += other.invalid_message_times;
        self.unrecognized_requests += other.unrecognized_requests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stats_record_and_merge() {
        let mut stats = LogStats::new();
        stats.record(&ParseOutcome::Skipped(SkipReason::UnrecognizedRequest));
        stats.record(&ParseOutcome::Skipped(SkipReason::InvalidJson));
        stats.record(&ParseOutcome::Skipped(SkipReason::InvalidMessageTime {
            value: "abc".to_string(),
        }));
        assert_eq!(stats.skipped(), 3);
        assert_eq!(stats.success_rate(), 0.0);

        let mut other = LogStats::new();
        other.parsed = 4;
        other.blank_lines = 2;
        other.record(&ParseOutcome::Skipped(SkipReason::InvalidEncoding));
        assert_eq!(other.invalid_encodings, 1);
        stats.merge(&other);

        assert_eq!(stats.parsed, 4);
        assert_eq!(stats.blank_lines, 2);
        assert_eq!(stats.invalid_encodings, 1);
        assert_eq!(stats.skipped(), 4);
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_message_time_accepts_numbers() {
        let message: RawLogMessage =
            serde_json::from_str(r#"{"_raw": "GET /", "_messagetime": 1500000000000}"#).unwrap();
        assert_eq!(message.message_time_text().as_deref(), Some("1500000000000"));

        let message: RawLogMessage = serde_json::from_str(r#"{"_raw": "GET /"}"#).unwrap();
        assert!(message.message_time_text().is_none());
    }
}
