//! Anchored access-log line parser.
//!
//! Grammar (fixed field order, anchored at the start of the line):
//!
//! ```text
//! <ip> (<fwd>) - - [<timestamp>] "<METHOD> <PATH> <PROTO>" <status> <size> <time> <worker> "<referer>" "<user_agent>"
//! ```
//!
//! A line that deviates from this shape is rejected whole; the parser never
//! guesses missing fields. The grammar is anchored at the start of the line
//! only, so content after the closing user-agent quote is ignored.

use super::model::{LogRecord, ParseError};
use super::MAX_LINE_SIZE;

/// Parse one raw access-log line into a [`LogRecord`].
pub fn parse_line(raw: &str) -> Result<LogRecord, ParseError> {
    if raw.len() > MAX_LINE_SIZE {
        return Err(ParseError::LineTooLarge(raw.len(), MAX_LINE_SIZE));
    }

    let mut rest = raw.trim_end_matches(['\r', '\n']);

    let ip_address = take_token(&mut rest, "client address")?;
    expect(&mut rest, " (", "forwarded-for field")?;
    let forwarded_for = take_until(&mut rest, ')', "forwarded-for field")?;
    if forwarded_for.is_empty() || forwarded_for.contains(char::is_whitespace) {
        return Err(ParseError::Truncated {
            expected: "forwarded-for token",
        });
    }
    expect(&mut rest, " - - [", "timestamp bracket")?;
    let timestamp = take_until(&mut rest, ']', "timestamp")?;
    if !is_timestamp_shape(timestamp) {
        return Err(ParseError::BadTimestamp(timestamp.to_string()));
    }

    expect(&mut rest, " \"", "request line")?;
    let request = take_quoted(&mut rest, "request line")?;
    validate_request(request)?;

    expect(&mut rest, " ", "status code")?;
    let status = take_number(&mut rest, "status code")?;
    if !(100..=599).contains(&status) {
        return Err(ParseError::StatusOutOfRange(status));
    }
    expect(&mut rest, " ", "response size")?;
    let response_size = take_number(&mut rest, "response size")?;
    expect(&mut rest, " ", "time taken")?;
    let time_taken = take_number(&mut rest, "time taken")?;

    expect(&mut rest, " ", "worker name")?;
    let worker = take_token(&mut rest, "worker name")?;

    expect(&mut rest, " \"", "referer")?;
    let referer = take_quoted(&mut rest, "referer")?;
    expect(&mut rest, " \"", "user agent")?;
    let user_agent = take_quoted(&mut rest, "user agent")?;

    Ok(LogRecord {
        ip_address: ip_address.to_string(),
        forwarded_for: forwarded_for.to_string(),
        timestamp: timestamp.to_string(),
        request: request.to_string(),
        // Range-checked above; the cast cannot truncate.
        status_code: status as u16,
        response_size,
        time_taken,
        referer: referer.to_string(),
        user_agent: user_agent.to_string(),
        balancer_worker_name: if worker == "-" {
            None
        } else {
            Some(worker.to_string())
        },
    })
}

/// Consume an exact literal, or fail with what was expected next.
fn expect(rest: &mut &str, literal: &str, expected: &'static str) -> Result<(), ParseError> {
    match rest.strip_prefix(literal) {
        Some(after) => {
            *rest = after;
            Ok(())
        }
        None => Err(ParseError::Truncated { expected }),
    }
}

/// Consume a non-empty run of non-whitespace characters. The delimiter that
/// ends the token is left in place for the caller.
fn take_token<'a>(rest: &mut &'a str, expected: &'static str) -> Result<&'a str, ParseError> {
    let end = rest
        .find(char::is_whitespace)
        .unwrap_or(rest.len());
    if end == 0 {
        return Err(ParseError::Truncated { expected });
    }
    let (token, after) = rest.split_at(end);
    *rest = after;
    Ok(token)
}

/// Consume everything up to (and including) `delim`.
fn take_until<'a>(
    rest: &mut &'a str,
    delim: char,
    expected: &'static str,
) -> Result<&'a str, ParseError> {
    match rest.find(delim) {
        Some(i) => {
            let value = &rest[..i];
            *rest = &rest[i + delim.len_utf8()..];
            Ok(value)
        }
        None => Err(ParseError::Truncated { expected }),
    }
}

/// Consume a quoted span whose opening quote was already consumed. The span
/// may be empty; a missing closing quote fails the line.
fn take_quoted<'a>(rest: &mut &'a str, field: &'static str) -> Result<&'a str, ParseError> {
    match rest.find('"') {
        Some(i) => {
            let value = &rest[..i];
            *rest = &rest[i + 1..];
            Ok(value)
        }
        None => Err(ParseError::UnterminatedQuote { field }),
    }
}

/// Consume a token that must be all ASCII digits and fit in a u64.
fn take_number(rest: &mut &str, field: &'static str) -> Result<u64, ParseError> {
    let token = take_token(rest, field)?;
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::BadNumber {
            field,
            value: token.to_string(),
        });
    }
    token.parse::<u64>().map_err(|_| ParseError::BadNumber {
        field,
        value: token.to_string(),
    })
}

/// Lexical shape check for `DD/Mon/YYYY:HH:MM:SS ±ZZZZ`: word characters,
/// colons and slashes, a single space, then a signed 4-digit zone offset.
/// The date itself is not validated against a calendar.
fn is_timestamp_shape(timestamp: &str) -> bool {
    let Some((date, zone)) = timestamp.split_once(' ') else {
        return false;
    };
    if date.is_empty()
        || !date
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b':' || b == b'/')
    {
        return false;
    }
    let zone = zone.as_bytes();
    zone.len() == 5
        && (zone[0] == b'+' || zone[0] == b'-')
        && zone[1..].iter().all(|b| b.is_ascii_digit())
}

/// A request line is exactly `METHOD PATH PROTOCOL`: three non-empty,
/// single-space-separated tokens with a strictly uppercase method.
fn validate_request(request: &str) -> Result<(), ParseError> {
    let mut parts = request.split(' ');
    let (Some(method), Some(path), Some(protocol), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedRequest(request.to_string()));
    };
    if method.is_empty()
        || !method.bytes().all(|b| b.is_ascii_uppercase())
        || path.is_empty()
        || protocol.is_empty()
    {
        return Err(ParseError::MalformedRequest(request.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "10.0.0.1 (10.0.0.1) - - [10/Oct/2023:13:55:36 +0000] \
        \"GET /api/v1/items HTTP/1.1\" 200 512 42 w1 \
        \"http://example.com/page\" \"curl/7.1\"";

    // ─── Well-formed lines ──────────────────────────────────────

    #[test]
    fn test_parse_sample_line() {
        let record = parse_line(SAMPLE).unwrap();
        assert_eq!(record.ip_address, "10.0.0.1");
        assert_eq!(record.forwarded_for, "10.0.0.1");
        assert_eq!(record.timestamp, "10/Oct/2023:13:55:36 +0000");
        assert_eq!(record.request, "GET /api/v1/items HTTP/1.1");
        assert_eq!(record.status_code, 200);
        assert_eq!(record.response_size, 512);
        assert_eq!(record.time_taken, 42);
        assert_eq!(record.balancer_worker_name.as_deref(), Some("w1"));
        assert_eq!(record.referer, "http://example.com/page");
        assert_eq!(record.user_agent, "curl/7.1");
    }

    #[test]
    fn test_round_trip() {
        let record = parse_line(SAMPLE).unwrap();
        let reparsed = parse_line(&record.to_access_log_line()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_round_trip_without_worker() {
        let line = "10.0.0.1 (10.0.0.2) - - [10/Oct/2023:13:55:36 +0000] \
            \"POST /submit HTTP/2\" 503 0 7 - \"\" \"Mozilla/5.0\"";
        let record = parse_line(line).unwrap();
        assert_eq!(record.balancer_worker_name, None);
        let reparsed = parse_line(&record.to_access_log_line()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_empty_referer_and_user_agent() {
        let line = "1.2.3.4 (5.6.7.8) - - [01/Jan/2024:00:00:00 -0500] \
            \"DELETE /x HTTP/1.0\" 204 0 1 w9 \"\" \"\"";
        let record = parse_line(line).unwrap();
        assert_eq!(record.referer, "");
        assert_eq!(record.user_agent, "");
        assert_eq!(record.balancer_worker_name.as_deref(), Some("w9"));
    }

    #[test]
    fn test_trailing_newline_accepted() {
        let line = format!("{}\n", SAMPLE);
        assert!(parse_line(&line).is_ok());
    }

    #[test]
    fn test_trailing_content_ignored() {
        // The grammar is anchored to the start of the line only.
        let line = format!("{} extra trailing junk", SAMPLE);
        let record = parse_line(&line).unwrap();
        assert_eq!(record.user_agent, "curl/7.1");
    }

    // ─── Malformed lines ────────────────────────────────────────

    fn assert_rejected(line: &str) {
        assert!(parse_line(line).is_err(), "should reject: {}", line);
    }

    #[test]
    fn test_empty_line_rejected() {
        assert_rejected("");
    }

    #[test]
    fn test_lowercase_method_rejected() {
        assert_rejected(&SAMPLE.replace("GET", "get"));
    }

    #[test]
    fn test_two_token_request_rejected() {
        assert_rejected(&SAMPLE.replace("GET /api/v1/items HTTP/1.1", "GET /api/v1/items"));
    }

    #[test]
    fn test_four_token_request_rejected() {
        assert_rejected(&SAMPLE.replace("HTTP/1.1", "HTTP/1.1 extra"));
    }

    #[test]
    fn test_non_numeric_status_rejected() {
        let line = SAMPLE.replace(" 200 ", " OK ");
        match parse_line(&line) {
            Err(ParseError::BadNumber { field, .. }) => assert_eq!(field, "status code"),
            other => panic!("expected BadNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_status_out_of_range_rejected() {
        let line = SAMPLE.replace(" 200 ", " 999 ");
        assert!(matches!(
            parse_line(&line),
            Err(ParseError::StatusOutOfRange(999))
        ));
    }

    #[test]
    fn test_signed_number_rejected() {
        assert_rejected(&SAMPLE.replace(" 512 ", " +512 "));
    }

    #[test]
    fn test_missing_closing_quote_rejected() {
        let line = "10.0.0.1 (10.0.0.1) - - [10/Oct/2023:13:55:36 +0000] \
            \"GET /a HTTP/1.1\" 200 512 42 w1 \"http://example.com\" \"curl/7.1";
        assert!(matches!(
            parse_line(line),
            Err(ParseError::UnterminatedQuote { field: "user agent" })
        ));
    }

    #[test]
    fn test_bad_timezone_rejected() {
        assert_rejected(&SAMPLE.replace("+0000", "UTC"));
        assert_rejected(&SAMPLE.replace("+0000", "+00"));
    }

    #[test]
    fn test_missing_forwarded_for_rejected() {
        assert_rejected(
            "10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] \
             \"GET /a HTTP/1.1\" 200 512 42 w1 \"r\" \"ua\"",
        );
    }

    #[test]
    fn test_missing_worker_field_rejected() {
        // Worker token absent entirely (not even a dash placeholder).
        assert_rejected(
            "10.0.0.1 (10.0.0.1) - - [10/Oct/2023:13:55:36 +0000] \
             \"GET /a HTTP/1.1\" 200 512 42 \"r\" \"ua\"",
        );
    }

    #[test]
    fn test_oversized_line_rejected() {
        let line = "a".repeat(MAX_LINE_SIZE + 1);
        assert!(matches!(
            parse_line(&line),
            Err(ParseError::LineTooLarge(_, _))
        ));
    }

    #[test]
    fn test_plain_text_rejected() {
        assert_rejected("Just some random text without structure");
    }
}
