//! Text codec for timestamps stored in `SQLite`.
//!
//! `SQLite` has no native timestamp type, so `recorded_at` is persisted as
//! RFC 3339 UTC text with nine fractional digits and a `Z` suffix:
//!
//! ```text
//! 2024-01-02T03:04:05.000000006Z
//! ```
//!
//! Every value with a four-digit year has the same width, which makes
//! lexicographic order identical to chronological order. Range predicates
//! and index scans can therefore compare the text column directly. Values
//! outside [`MIN_STORABLE_YEAR`]..=[`MAX_STORABLE_YEAR`] format with a sign
//! and must be rejected before they reach a query; see [`is_storable`].

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

/// Earliest year the storage format keeps in order.
pub const MIN_STORABLE_YEAR: i32 = 0;

/// Latest year the storage format keeps in order.
pub const MAX_STORABLE_YEAR: i32 = 9999;

/// Format a timestamp in the fixed-width storage representation.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Whether `ts` formats as a fixed-width, correctly ordered string.
pub fn is_storable(ts: &DateTime<Utc>) -> bool {
    (MIN_STORABLE_YEAR..=MAX_STORABLE_YEAR).contains(&ts.year())
}

/// Parse any RFC 3339 timestamp and normalise it to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Whether a timestamp is the zero value (the Unix epoch).
///
/// Wire clients that cannot express "absent" send the zero timestamp.
pub fn is_zero(ts: &DateTime<Utc>) -> bool {
    ts.timestamp() == 0 && ts.timestamp_subsec_nanos() == 0
}
