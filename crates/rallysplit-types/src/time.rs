//! Timestamp encoding for the store.
//!
//! All load-bearing timestamps are written as fixed-width RFC 3339 UTC
//! strings (millisecond precision, trailing `Z`), so lexicographic SQL
//! comparison is chronological comparison.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

pub fn format_ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp. Accepts RFC 3339 and, as a fallback, SQLite's
/// bare `datetime('now')` format ("YYYY-MM-DD HH:MM:SS"), which the schema
/// defaults produce for `created_at` columns.
pub fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_rfc3339() {
        let dt = Utc.with_ymd_and_hms(2025, 6, 14, 20, 30, 0).unwrap();
        let raw = format_ts(dt);
        assert_eq!(raw, "2025-06-14T20:30:00.000Z");
        assert_eq!(parse_ts(&raw), Some(dt));
    }

    #[test]
    fn parses_sqlite_default_format() {
        let parsed = parse_ts("2025-06-14 20:30:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 14, 20, 30, 0).unwrap());
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 12, 1, 8, 0, 0).unwrap();
        assert!(format_ts(early) < format_ts(late));
    }
}
