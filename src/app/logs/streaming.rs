//! Log streaming functionality for memory-efficient processing
//!
//! Request log exports are JSON lines files that can run to millions of
//! messages. This module parses them one line at a time so records can be
//! folded into counts without keeping the messages around.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tracing::{debug, error, info, warn};

use super::parser::parse_log_line;
use super::types::{LogStats, ParseOutcome, SkipReason};
use crate::errors::{LogError, LogResult};

/// Streaming JSON-lines log parser with skip accounting
pub struct LogStreamer {
    /// Current processing statistics
    stats: LogStats,
    /// Current line number for diagnostics
    current_line: usize,
}

impl LogStreamer {
    /// Create a new log streamer
    pub fn new() -> Self {
        Self {
            stats: LogStats::new(),
            current_line: 0,
        }
    }

    /// Stream parse outcomes from a JSON-lines log file
    ///
    /// # Arguments
    ///
    /// * `log_path` - Path to the log file
    ///
    /// # Returns
    ///
    /// An async stream yielding one [`ParseOutcome`] per non-blank line. Lines
    /// that cannot be decoded or parsed come through as `Skipped` and are
    /// counted in [`LogStreamer::stats`]; only I/O failures are yielded as
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns `LogError::NotFound` if the file does not exist and
    /// `LogError::Io` if it cannot be opened.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use futures::StreamExt;
    /// use spandex_usage::app::logs::{LogStreamer, ParseOutcome};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut streamer = LogStreamer::new();
    /// let mut stream = streamer.stream("requests.logs.json").await?;
    ///
    /// while let Some(result) = stream.next().await {
    ///     if let ParseOutcome::Parsed(record) = result? {
    ///         println!("{} requested {}", record.timestamp, record.dataset_id);
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stream<P: AsRef<Path>>(
        &mut self,
        log_path: P,
    ) -> LogResult<impl Stream<Item = LogResult<ParseOutcome>> + '_> {
        let log_path = log_path.as_ref();
        let file = File::open(log_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogError::NotFound {
                    path: log_path.to_path_buf(),
                }
            } else {
                LogError::Io {
                    path: log_path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let segments = BufReader::new(file).split(b'\n');

        info!("Reading request logs from {}", log_path.display());

        Ok(ParseOutcomeStream {
            segments,
            path: log_path.to_path_buf(),
            streamer: self,
        })
    }

    /// Process a single raw log line
    fn process_line(&mut self, bytes: Vec<u8>) -> Option<ParseOutcome> {
        self.current_line += 1;
        self.stats.lines_processed += 1;

        let outcome = match String::from_utf8(bytes) {
            Ok(line) if line.trim().is_empty() => {
                self.stats.blank_lines += 1;
                return None;
            }
            Ok(line) => parse_log_line(line.trim()),
            Err(_) => ParseOutcome::Skipped(SkipReason::InvalidEncoding),
        };
        self.stats.record(&outcome);

        if let ParseOutcome::Skipped(reason) = &outcome {
            debug!("Skipping log line {}: {}", self.current_line, reason);
        }

        if self.stats.progress_due() {
            debug!(
                "Processed {} log lines ({:.1}% parsed)",
                self.stats.lines_processed,
                self.stats.success_rate()
            );
        }

        Some(outcome)
    }

    /// Get current processing statistics
    pub fn stats(&self) -> &LogStats {
        &self.stats
    }

    /// Reset the streamer state before reading another file
    pub fn reset(&mut self) {
        self.stats = LogStats::new();
        self.current_line = 0;
    }
}

impl Default for LogStreamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream implementation for parse outcomes
pub struct ParseOutcomeStream<'a> {
    segments: Split<BufReader<File>>,
    path: PathBuf,
    streamer: &'a mut LogStreamer,
}

impl Stream for ParseOutcomeStream<'_> {
    type Item = LogResult<ParseOutcome>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match Pin::new(&mut this.segments).poll_next_segment(cx) {
                Poll::Ready(Ok(Some(line))) => {
                    if let Some(outcome) = this.streamer.process_line(line) {
                        return Poll::Ready(Some(Ok(outcome)));
                    }
                    // Blank line, read the next one
                }
                Poll::Ready(Ok(None)) => {
                    let stats = this.streamer.stats();
                    info!(
                        "Log processing completed: {} records from {} lines ({:.1}% parsed)",
                        stats.parsed,
                        stats.lines_processed,
                        stats.success_rate()
                    );

                    if stats.skipped() > 0 {
                        warn!(
                            "Skipped {} unparseable log lines ({} not UTF-8, {} malformed, {} bad timestamps, {} unrecognized requests)",
                            stats.skipped(),
                            stats.invalid_encodings,
                            stats.malformed_messages,
                            stats.invalid_message_times,
                            stats.unrecognized_requests
                        );
                    }

                    return Poll::Ready(None);
                }
                Poll::Ready(Err(e)) => {
                    error!("Error reading log file {}: {}", this.path.display(), e);
                    return Poll::Ready(Some(Err(LogError::Io {
                        path: this.path.clone(),
                        source: e,
                    })));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;

    async fn create_test_log(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    /// Test that valid messages are parsed and bad ones skipped without
    /// stopping the stream.
    ///
    /// Purpose: Verifies that one bad line never aborts a run and that every
    /// skip is reflected in the statistics.
    #[tokio::test]
    async fn test_stream_skips_bad_lines() {
        let content = r#"{"_raw": "GET /suggest/alpha.1/published/abcd-efgh?text=a", "_messagetime": "1500000000000"}

{"_raw": "GET /healthz", "_messagetime": "1500000000000"}
not json at all
{"_raw": "GET /suggest/alpha.2/published/abcd-efgh", "_messagetime": "bogus"}
{"_raw": "GET /suggest/alpha.1/published/wxyz-0000", "_messagetime": "1500000001000"}"#;

        let log_file = create_test_log(content).await;
        let mut streamer = LogStreamer::new();

        let (records, skipped) = {
            let mut stream = streamer.stream(log_file.path()).await.unwrap();
            let mut records = Vec::new();
            let mut skipped = 0;
            while let Some(result) = stream.next().await {
                match result.unwrap() {
                    ParseOutcome::Parsed(record) => records.push(record),
                    ParseOutcome::Skipped(_) => skipped += 1,
                }
            }
            (records, skipped)
        };

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dataset_id, "alpha.1");
        assert_eq!(records[1].column_id, "wxyz-0000");
        assert_eq!(skipped, 3);

        let stats = streamer.stats();
        assert_eq!(stats.lines_processed, 6);
        assert_eq!(stats.blank_lines, 1);
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.unrecognized_requests, 1);
        assert_eq!(stats.malformed_messages, 1);
        assert_eq!(stats.invalid_message_times, 1);
    }

    /// Test that a line which is not valid UTF-8 is skipped like any other
    /// bad line.
    ///
    /// Purpose: Verifies that undecodable bytes never end the stream early.
    #[tokio::test]
    async fn test_stream_skips_invalid_utf8() {
        let good = br#"{"_raw": "GET /suggest/alpha.1/published/abcd-efgh", "_messagetime": "1500000000000"}"#;
        let mut content = Vec::new();
        content.extend_from_slice(good);
        content.extend_from_slice(b"\n{\"_raw\": \"GET \xff\xfe garbage\"}\n");
        content.extend_from_slice(good);
        content.extend_from_slice(b"\r\n");

        let mut log_file = NamedTempFile::new().unwrap();
        log_file.write_all(&content).unwrap();
        log_file.flush().unwrap();

        let mut streamer = LogStreamer::new();
        let outcomes: Vec<ParseOutcome> = {
            let stream = streamer.stream(log_file.path()).await.unwrap();
            stream.map(|result| result.unwrap()).collect().await
        };

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], ParseOutcome::Parsed(_)));
        assert_eq!(
            outcomes[1],
            ParseOutcome::Skipped(SkipReason::InvalidEncoding)
        );
        assert!(matches!(outcomes[2], ParseOutcome::Parsed(_)));

        let stats = streamer.stats();
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.invalid_encodings, 1);
        assert_eq!(stats.skipped(), 1);
    }

    #[tokio::test]
    async fn test_stream_missing_file() {
        let mut streamer = LogStreamer::new();
        let result = streamer.stream("/nonexistent/requests.json").await;
        assert!(matches!(result, Err(LogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_reset() {
        let log_file = create_test_log(
            r#"{"_raw": "GET /suggest/alpha.1/published/abcd-efgh", "_messagetime": "1500000000"}"#,
        )
        .await;
        let mut streamer = LogStreamer::new();
        {
            let stream = streamer.stream(log_file.path()).await.unwrap();
            let outcomes: Vec<_> = stream.collect().await;
            assert_eq!(outcomes.len(), 1);
        }
        assert_eq!(streamer.stats().parsed, 1);

        streamer.reset();
        assert_eq!(streamer.stats().lines_processed, 0);
    }
}
