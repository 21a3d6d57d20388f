//! Display helpers for dates shown alongside pipeline records.
//!
//! Relative times are bucketed from a whole-day count computed with fixed
//! 24 hour days, so DST shifts and leap seconds are ignored.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, FormatError> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| FormatError::InvalidDate(input.to_string()))
}

/// Short US-style date, e.g. `Jan 5, 2024`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn format_relative_time(date: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let days = (*now - *date).num_milliseconds().div_euclid(MS_PER_DAY);

    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        d if d < 7 => format!("{d} days ago"),
        d if d < 30 => ago(d / 7, "week"),
        d if d < 365 => ago(d / 30, "month"),
        d => ago(d / 365, "year"),
    }
}

fn ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
