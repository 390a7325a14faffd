//! Wall-clock readings in the units the models persist.

use chrono::Utc;

/// Nanoseconds since the Unix epoch.
pub fn now_ns() -> i64 {
    // Out of range only after the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Whole seconds since the Unix epoch.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Fractional seconds since the Unix epoch.
pub fn now_secs_f64() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
