//! Coercion of raw text values into typed readings.
//!
//! Neither function here fails: text which can't be interpreted becomes `None`, so that a bad
//! value never costs the rest of its row.
use crate::units::Energy;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried (in order) for timestamps without a UTC offset
const NAIVE_TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse an energy value, returning `None` for empty, non-numeric or non-finite text
pub fn parse_kwh(s: &str) -> Option<Energy> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Energy)
}

/// Parse a timestamp, returning `None` if it isn't in a recognised format.
///
/// Timestamps with a UTC offset keep their wall-clock time, so that calendar days are those of
/// the meter's own location.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
