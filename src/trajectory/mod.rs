//! Trajectory sources: the facility dataset, a synthetic day, and the
//! outage scenario derived from either.

/// Facility dataset loader (CSV).
pub mod dataset;
pub mod forecast;
/// Storm-window outage scenario generator.
pub mod outage;
/// Seeded synthetic load trajectory.
pub mod synthetic;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};

pub use crate::sim::types::TrajectoryPoint;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Extracts the time of day from a timestamp label.
///
/// Accepts RFC 3339, ISO-like date-times with `T` or a space separator, and
/// bare `HH:MM` / `HH:MM:SS` labels. Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use outage_sim::trajectory::time_of_day;
///
/// let t = NaiveTime::from_hms_opt(2, 30, 0);
/// assert_eq!(time_of_day("2024-01-01T02:30:00.000"), t);
/// assert_eq!(time_of_day("02:30"), t);
/// assert_eq!(time_of_day("not a time"), None);
/// ```
pub fn time_of_day(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(label) {
        return Some(dt.naive_local().time());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(label, fmt).ok())
        .map(|dt| dt.time())
        .or_else(|| parse_clock(label))
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(label: &str) -> Option<NaiveTime> {
    let label = label.trim();
    NaiveTime::parse_from_str(label, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(label, "%H:%M"))
        .ok()
}

/// Truncates a time of day to whole minutes.
pub(crate) fn to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}
