use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Average upload time reported for a device that never sent a sample
pub const ZERO_UPLOAD_TIME: &str = "0m0.000000000s";

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;
const SECONDS_PER_MINUTE: f64 = 60.0;
const NANOS_PER_SECOND_INT: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND_INT;

/// How the heartbeat count is related to the observed time span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UptimeFormula {
    /// `count / (minutes_elapsed + 1) * 100`: every minute slot of the span,
    /// both ends included, is expected to hold one heartbeat.
    #[default]
    Inclusive,
    /// `count / minutes_elapsed * 100`. A zero span scores 100.
    Span,
}

/// Derived statistics for a single device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStats {
    /// Heartbeat density as a percentage (not clamped to 100)
    pub uptime: f64,
    /// Mean upload duration, formatted as `<m>m<s.sssssssss>s`
    pub avg_upload_time: String,
}

impl DeviceStats {
    pub fn compute(
        formula: UptimeFormula,
        heartbeats: &[DateTime<Utc>],
        upload_samples: &[i64],
    ) -> Self {
        Self {
            uptime: compute_uptime_with(formula, heartbeats),
            avg_upload_time: compute_average_upload_time(upload_samples),
        }
    }
}

/// Uptime using the default [`UptimeFormula::Inclusive`] formula
pub fn compute_uptime(heartbeats: &[DateTime<Utc>]) -> f64 {
    compute_uptime_with(UptimeFormula::default(), heartbeats)
}

/// Heartbeat density over the observed span, assuming one heartbeat per minute.
///
/// No heartbeats scores 0 and a single heartbeat scores 100. For two or more,
/// the span runs from the first to the last heartbeat in arrival order; its
/// sign is ignored. Bursts above one per minute score above 100.
pub fn compute_uptime_with(formula: UptimeFormula, heartbeats: &[DateTime<Utc>]) -> f64 {
    let (first, last) = match heartbeats {
        [] => return 0.0,
        [_] => return 100.0,
        [first, .., last] => (first, last),
    };

    let minutes_elapsed = minutes_between(first, last);
    let count = heartbeats.len() as f64;

    match formula {
        UptimeFormula::Inclusive => count / (minutes_elapsed + 1.0) * 100.0,
        UptimeFormula::Span if minutes_elapsed == 0.0 => 100.0,
        UptimeFormula::Span => count / minutes_elapsed * 100.0,
    }
}

fn minutes_between(first: &DateTime<Utc>, last: &DateTime<Utc>) -> f64 {
    let elapsed = last.signed_duration_since(*first).abs();
    let seconds = match elapsed.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_SECOND,
        // spans beyond ~292 years overflow i64 nanoseconds
        None => elapsed.num_milliseconds() as f64 / 1_000.0,
    };
    seconds / SECONDS_PER_MINUTE
}

/// Mean of the upload samples (nanoseconds) formatted as minutes and seconds.
///
/// The mean is rounded to the nearest nanosecond before being split, so the
/// seconds part always stays below 60.
pub fn compute_average_upload_time(samples: &[i64]) -> String {
    if samples.is_empty() {
        return ZERO_UPLOAD_TIME.to_string();
    }

    let sum: i128 = samples.iter().map(|&s| s as i128).sum();
    let count = samples.len() as i128;
    // floor(sum / count + 1/2)
    let mean_nanos = (2 * sum + count).div_euclid(2 * count);
    format_upload_time(mean_nanos)
}

fn format_upload_time(total_nanos: i128) -> String {
    let minutes = total_nanos.div_euclid(NANOS_PER_MINUTE);
    let remainder = total_nanos.rem_euclid(NANOS_PER_MINUTE);
    format!(
        "{}m{}.{:09}s",
        minutes,
        remainder / NANOS_PER_SECOND_INT,
        remainder % NANOS_PER_SECOND_INT
    )
}
