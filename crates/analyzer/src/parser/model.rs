use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One ingested access-log line. Immutable once created by the parser.
///
/// The `timestamp` field is kept as the verbatim `DD/Mon/YYYY:HH:MM:SS ±ZZZZ`
/// token from the log line; analytics that need calendar arithmetic derive
/// it on demand (see [`crate::analytics::time`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Client address token.
    pub ip_address: String,
    /// Proxy-forwarded address token (the parenthesized field).
    pub forwarded_for: String,
    /// Verbatim timestamp token, bracket-delimited in the source line.
    pub timestamp: String,
    /// Raw `METHOD PATH PROTOCOL` triplet, single space-separated.
    pub request: String,
    pub status_code: u16,
    /// Response body size in bytes.
    pub response_size: u64,
    /// Request duration in the unit the source log uses (whole units).
    pub time_taken: u64,
    /// May be empty when the client sent no referer.
    pub referer: String,
    pub user_agent: String,
    /// Backend worker that served the request. `None` when the log carries
    /// a `-` placeholder (or the store holds a record without one).
    pub balancer_worker_name: Option<String>,
}

impl LogRecord {
    /// Render the record back into one access-log line, in the exact import
    /// grammar order (worker between time_taken and referer, referer before
    /// user_agent). Re-parsing the rendered line reproduces the record
    /// field-for-field.
    pub fn to_access_log_line(&self) -> String {
        format!(
            "{} ({}) - - [{}] \"{}\" {} {} {} {} \"{}\" \"{}\"",
            self.ip_address,
            self.forwarded_for,
            self.timestamp,
            self.request,
            self.status_code,
            self.response_size,
            self.time_taken,
            self.balancer_worker_name.as_deref().unwrap_or("-"),
            self.referer,
            self.user_agent,
        )
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Line truncated: expected {expected}")]
    Truncated { expected: &'static str },

    #[error("Malformed request line: {0:?}")]
    MalformedRequest(String),

    #[error("Malformed timestamp: {0:?}")]
    BadTimestamp(String),

    #[error("Invalid {field}: {value:?}")]
    BadNumber { field: &'static str, value: String },

    #[error("Status code out of range: {0}")]
    StatusOutOfRange(u64),

    #[error("Unterminated quote in {field}")]
    UnterminatedQuote { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LogRecord {
        LogRecord {
            ip_address: "10.0.0.1".to_string(),
            forwarded_for: "10.0.0.1".to_string(),
            timestamp: "10/Oct/2023:13:55:36 +0000".to_string(),
            request: "GET /api/v1/items HTTP/1.1".to_string(),
            status_code: 200,
            response_size: 512,
            time_taken: 42,
            referer: "http://example.com/page".to_string(),
            user_agent: "curl/7.1".to_string(),
            balancer_worker_name: Some("w1".to_string()),
        }
    }

    #[test]
    fn test_render_grammar_order() {
        let line = sample_record().to_access_log_line();
        assert_eq!(
            line,
            "10.0.0.1 (10.0.0.1) - - [10/Oct/2023:13:55:36 +0000] \
             \"GET /api/v1/items HTTP/1.1\" 200 512 42 w1 \
             \"http://example.com/page\" \"curl/7.1\""
        );
    }

    #[test]
    fn test_render_missing_worker_as_dash() {
        let mut record = sample_record();
        record.balancer_worker_name = None;
        assert!(record.to_access_log_line().contains(" 42 - \""));
    }

    #[test]
    fn test_render_empty_referer() {
        let mut record = sample_record();
        record.referer = String::new();
        assert!(record.to_access_log_line().contains("w1 \"\" \"curl/7.1\""));
    }

    #[test]
    fn test_json_round_trip() {
        let record = sample_record();
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }
}
