//! WebKit timestamps: microseconds since 1601-01-01 UTC

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 and the Unix epoch
pub const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

const MICROS_PER_SEC: i64 = 1_000_000;

pub fn webkit_to_datetime(micros: i64) -> DateTime<Utc> {
    let unix_micros = micros.saturating_sub(WEBKIT_EPOCH_OFFSET_SECS * MICROS_PER_SEC);
    DateTime::from_timestamp_micros(unix_micros).unwrap_or_default()
}

pub fn datetime_to_webkit(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_micros() + WEBKIT_EPOCH_OFFSET_SECS * MICROS_PER_SEC
}
