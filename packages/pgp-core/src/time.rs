//! Time utilities.
//!
//! Timestamps are stored and framed as Unix seconds; RFC 3339 strings are
//! only produced for listings.

use chrono::{TimeZone, Utc};

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Formats a Unix timestamp as an RFC 3339 string (UTC).
///
/// Out-of-range values fall back to the raw number.
pub fn to_rfc3339(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.to_rfc3339(),
        None => timestamp.to_string(),
    }
}
