//! UTC time helpers.
//!
//! Every event carries a server-assigned timestamp in milliseconds since the
//! Unix epoch so clients can reconstruct a total order over the events they
//! actually receive.

use chrono::{DateTime, Utc};

/// Current Unix timestamp in milliseconds (UTC).
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a millisecond Unix timestamp as an RFC 3339 string (UTC).
///
/// Falls back to the epoch for out-of-range values.
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap())
        .to_rfc3339()
}
