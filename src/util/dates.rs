//! Calendar date helpers for runs anchored to a reference start date.
//!
//! Virtual time is measured in hours. A run whose projects start on calendar
//! dates uses the earliest start as its reference; every date is converted
//! to an hour offset from it.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a date or date-time string in any of the accepted layouts.
/// Bare dates resolve to midnight.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Canonical textual form used when serializing dates.
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Hours from `reference` to `date`, rounded up to the next whole hour.
#[allow(clippy::cast_precision_loss)]
pub fn start_offset_hours(reference: NaiveDateTime, date: NaiveDateTime) -> f64 {
    let seconds = (date - reference).num_seconds() as f64;
    (seconds / SECONDS_PER_HOUR).ceil()
}

/// Whole days from `reference` to `date` (floored), expressed in hours.
///
/// Dates before the reference yield a negative value.
#[allow(clippy::cast_precision_loss)]
pub fn whole_day_delay_hours(reference: NaiveDateTime, date: NaiveDateTime) -> f64 {
    let days = (date - reference).num_seconds().div_euclid(SECONDS_PER_DAY);
    (days * 24) as f64
}

/// Calendar date `hours` after `reference`, to millisecond precision.
#[allow(clippy::cast_possible_truncation)]
pub fn add_hours(reference: NaiveDateTime, hours: f64) -> NaiveDateTime {
    let millis = (hours * SECONDS_PER_HOUR * 1000.0).round() as i64;
    reference + TimeDelta::milliseconds(millis)
}
