use chrono::{DateTime, Utc};

/// Rounds to hundredths of a second, the precision stored in results.
pub fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// Seconds from `start` to `at`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    let millis = (at - start).num_milliseconds().max(0);
    round_centis(millis as f64 / 1000.0)
}
