//! Human-friendly sizes and relative times.

use chrono::{DateTime, Utc};

const SIZE_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 12 * MONTH;
const LONG_TIME: u64 = 37 * YEAR;

/// Format a byte count with SI units, e.g. `82 B`, `1.5 kB`, `83 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: u64) -> String {
    if size < 10 {
        return format!("{size} B");
    }

    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if unit == 0 {
        format!("{size} B")
    } else if rounded < 10.0 {
        format!("{rounded:.1} {}", SIZE_UNITS[unit])
    } else {
        format!("{rounded:.0} {}", SIZE_UNITS[unit])
    }
}

/// Describe `then` relative to `now`, e.g. `now`, `5 minutes ago`, `2 days from now`.
#[must_use]
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let suffix = if delta >= 0 { "ago" } else { "from now" };
    let secs = delta.unsigned_abs();

    let phrase = match secs {
        0 => return "now".to_string(),
        s if s < 2 => "1 second".to_string(),
        s if s < MINUTE => format!("{s} seconds"),
        s if s < 2 * MINUTE => "1 minute".to_string(),
        s if s < HOUR => format!("{} minutes", s / MINUTE),
        s if s < 2 * HOUR => "1 hour".to_string(),
        s if s < DAY => format!("{} hours", s / HOUR),
        s if s < 2 * DAY => "1 day".to_string(),
        s if s < WEEK => format!("{} days", s / DAY),
        s if s < 2 * WEEK => "1 week".to_string(),
        s if s < MONTH => format!("{} weeks", s / WEEK),
        s if s < 2 * MONTH => "1 month".to_string(),
        s if s < YEAR => format!("{} months", s / MONTH),
        s if s < 18 * MONTH => "1 year".to_string(),
        s if s < 2 * YEAR => "2 years".to_string(),
        s if s < LONG_TIME => format!("{} years", s / YEAR),
        _ => "a long while".to_string(),
    };
    format!("{phrase} {suffix}")
}
