//! Calendar arithmetic over the fixed lexical timestamp format.
//!
//! Records keep their timestamp verbatim (`DD/Mon/YYYY:HH:MM:SS ±ZZZZ`).
//! The parser guarantees the lexical shape but not calendar validity, so
//! every helper here returns `Option` and time-deriving analytics skip
//! records that fail to parse.

use chrono::{DateTime, FixedOffset, Timelike, Utc};

/// strftime pattern for the access-log timestamp token.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

/// Truncate a record timestamp to its minute: `YYYY-MM-DD HH:MM`.
///
/// The bucket label keeps the record's own clock face; the zone offset is
/// not normalized away.
pub fn minute_bucket(timestamp: &str) -> Option<String> {
    parse_timestamp(timestamp).map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Floor a record timestamp to an `n`-minute bucket: the bucket boundary is
/// `(minute / n) * n`, so n=5 produces `HH:00`, `HH:05`, … labels.
pub fn period_bucket(timestamp: &str, n: u32) -> Option<String> {
    if n == 0 {
        return None;
    }
    let dt = parse_timestamp(timestamp)?;
    let floored = (dt.minute() / n) * n;
    Some(format!(
        "{} {:02}:{:02}",
        dt.format("%Y-%m-%d"),
        dt.hour(),
        floored
    ))
}

/// True when the record timestamp falls within the trailing `minutes`-long
/// window ending at `now`. A window of zero or negative length matches
/// nothing; an unparsable timestamp never matches.
pub fn within_window(timestamp: &str, now: DateTime<Utc>, minutes: i64) -> bool {
    if minutes <= 0 {
        return false;
    }
    match parse_timestamp(timestamp) {
        Some(dt) => dt.with_timezone(&Utc) >= now - chrono::Duration::minutes(minutes),
        None => false,
    }
}
