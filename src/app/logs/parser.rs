//! Request line and message time decoding
//!
//! Only one request grammar is understood:
//!
//! ```text
//! GET /suggest/<dataset_id>/<pub_stage>/<column_id>[?<query_string>]
//! ```
//!
//! where `dataset_id` is `alpha.<digits>`, `pub_stage` is one or more letters
//! and `column_id` is two groups of four lowercase alphanumerics joined by `-`.

use chrono::{DateTime, Local, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{LogRecord, ParseOutcome, QueryParams, RawLogMessage, SkipReason};
use crate::constants::logs::{
    MESSAGE_TIME_EPOCH_CHARS, MESSAGE_TIME_FIELD, RAW_FIELD, REQUEST_PATH_PATTERN,
};

static REQUEST_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(REQUEST_PATH_PATTERN).expect("request path pattern must compile"));

/// Fields captured from a suggest request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParts {
    pub dataset_id: String,
    pub pub_stage: String,
    pub column_id: String,
    pub query_params: QueryParams,
}

/// Decode a `_messagetime` value into local time
///
/// Only the first ten characters are read, as integer epoch seconds. The log
/// source pads the value (milliseconds plus extra digits), so the rest of the
/// string is ignored whatever it contains. Values shorter than ten characters
/// are read whole.
pub fn decode_message_time(raw: &str) -> Option<DateTime<Local>> {
    let end = raw
        .char_indices()
        .nth(MESSAGE_TIME_EPOCH_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(raw.len());
    let seconds: i64 = raw[..end].parse().ok()?;
    Local.timestamp_opt(seconds, 0).single()
}

/// Decode a form-encoded query string
///
/// Pairs are `&`-separated and split on the first `=`. Values keep their order
/// per key; pairs with a blank value are dropped.
pub fn parse_query_string(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

/// Match a raw request line against the suggest grammar
///
/// The grammar may appear anywhere in the line (access log prefixes are
/// tolerated). Returns `None` when it does not appear at all.
pub fn parse_request_line(raw: &str) -> Option<RequestParts> {
    let captures = REQUEST_PATH_RE.captures(raw)?;

    Some(RequestParts {
        dataset_id: captures["dataset_id"].to_string(),
        pub_stage: captures["pub_stage"].to_string(),
        column_id: captures["column_id"].to_string(),
        query_params: captures
            .name("query_params")
            .map(|m| parse_query_string(m.as_str()))
            .unwrap_or_default(),
    })
}

/// Parse one raw log message
///
/// Never fails: messages that cannot be decoded come back as
/// [`ParseOutcome::Skipped`] with the reason.
pub fn parse_log_record(message: &RawLogMessage) -> ParseOutcome {
    let Some(message_time) = message.message_time_text() else {
        return ParseOutcome::Skipped(SkipReason::MissingField {
            field: MESSAGE_TIME_FIELD,
        });
    };
    let Some(raw) = message.raw.as_deref() else {
        return ParseOutcome::Skipped(SkipReason::MissingField { field: RAW_FIELD });
    };

    let Some(timestamp) = decode_message_time(&message_time) else {
        return ParseOutcome::Skipped(SkipReason::InvalidMessageTime {
            value: message_time,
        });
    };
    let Some(parts) = parse_request_line(raw) else {
        return ParseOutcome::Skipped(SkipReason::UnrecognizedRequest);
    };

    ParseOutcome::Parsed(LogRecord {
        timestamp,
        dataset_id: parts.dataset_id,
        pub_stage: parts.pub_stage,
        column_id: parts.column_id,
        query_params: parts.query_params,
    })
}

/// Parse one JSON-lines log line
pub fn parse_log_line(line: &str) -> ParseOutcome {
    match serde_json::from_str::<RawLogMessage>(line) {
        Ok(message) => parse_log_record(&message),
        Err(_) => ParseOutcome::Skipped(SkipReason::InvalidJson),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line_with_query() {
        let raw = "10.0.0.1 - - GET /suggest/alpha.1234/published/abcd-12ef?text=chi&size=10&text=nyc HTTP/1.1 200";
        let parts = parse_request_line(raw).unwrap();

        assert_eq!(parts.dataset_id, "alpha.1234");
        assert_eq!(parts.pub_stage, "published");
        assert_eq!(parts.column_id, "abcd-12ef");
        assert_eq!(
            parts.query_params.get("text"),
            Some(&vec!["chi".to_string(), "nyc".to_string()])
        );
        assert_eq!(parts.query_params.get("size"), Some(&vec!["10".to_string()]));
    }

    #[test]
    fn test_parse_request_line_without_query() {
        let parts = parse_request_line("GET /suggest/alpha.7/unpublished/a1b2-c3d4").unwrap();
        assert_eq!(parts.dataset_id, "alpha.7");
        assert_eq!(parts.pub_stage, "unpublished");
        assert!(parts.query_params.is_empty());
    }

    #[test]
    fn test_parse_request_line_rejects_other_shapes() {
        // Wrong method, wrong dataset prefix, uppercase column, short column
        for raw in [
            "POST /suggest/alpha.1/published/abcd-efgh",
            "GET /suggest/beta.1/published/abcd-efgh",
            "GET /suggest/alpha.1/published/ABCD-EFGH",
            "GET /suggest/alpha.1/published/abc-efgh",
            "GET /suggest/alpha.1/pub2/abcd-efgh",
            "GET /version",
        ] {
            assert!(parse_request_line(raw).is_none(), "should reject {raw}");
        }
    }

    #[test]
    fn test_query_string_decoding() {
        let params = parse_query_string("text=new+york&text=caf%C3%A9&empty=&flag&=anon");
        assert_eq!(
            params.get("text"),
            Some(&vec!["new york".to_string(), "café".to_string()])
        );
        assert!(!params.contains_key("empty"));
        assert!(!params.contains_key("flag"));
        assert_eq!(params.get(""), Some(&vec!["anon".to_string()]));
    }

    #[test]
    fn test_message_time_uses_first_ten_characters() {
        let expected = Local.timestamp_opt(1_500_000_000, 0).single();
        assert_eq!(decode_message_time("1500000000"), expected);
        assert_eq!(decode_message_time("1500000000123"), expected);
        assert_eq!(decode_message_time("1500000000999xyz"), expected);
        assert_eq!(decode_message_time("1500000000.5"), expected);
    }

    #[test]
    fn test_message_time_rejects_non_numeric_prefix() {
        assert!(decode_message_time("15000x0000123").is_none());
        assert!(decode_message_time("").is_none());
        assert!(decode_message_time("yesterday at noon").is_none());
    }

    #[test]
    fn test_parse_log_record_outcomes() {
        let good = RawLogMessage::new(
            "GET /suggest/alpha.42/published/abcd-efgh?text=x",
            "1500000000000",
        );
        match parse_log_record(&good) {
            ParseOutcome::Parsed(record) => {
                assert_eq!(record.dataset_id, "alpha.42");
                assert_eq!(record.timestamp.timestamp(), 1_500_000_000);
            }
            other => panic!("expected parsed record, got {other:?}"),
        }

        let bad_line = RawLogMessage::new("GET /status", "1500000000000");
        assert_eq!(
            parse_log_record(&bad_line),
            ParseOutcome::Skipped(SkipReason::UnrecognizedRequest)
        );

        let bad_time = RawLogMessage::new("GET /suggest/alpha.1/published/abcd-efgh", "soon");
        assert!(matches!(
            parse_log_record(&bad_time),
            ParseOutcome::Skipped(SkipReason::InvalidMessageTime { .. })
        ));

        let missing = RawLogMessage {
            raw: None,
            ..RawLogMessage::new("", "1500000000000")
        };
        assert_eq!(
            parse_log_record(&missing),
            ParseOutcome::Skipped(SkipReason::MissingField { field: RAW_FIELD })
        );
    }

    #[test]
    fn test_parse_log_line_invalid_json_is_skipped() {
        assert_eq!(
            parse_log_line("{not json"),
            ParseOutcome::Skipped(SkipReason::InvalidJson)
        );
        assert!(!parse_log_line(
            r#"{"_raw": "GET /suggest/alpha.1/published/abcd-efgh", "_messagetime": "1500000000000"}"#
        )
        .is_skipped());
    }
}
