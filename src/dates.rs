//! Calendar helpers. Everything works on `NaiveDate`; callers pass "today"
//! explicitly so the rules stay testable.

use chrono::{Datelike, Days, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Interviews at least this many days old move to Reminder.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 2;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// True when `date` lies `threshold_days` or more calendar days before `today`.
pub fn is_stale(date: NaiveDate, today: NaiveDate, threshold_days: i64) -> bool {
    (today - date).num_days() >= threshold_days
}

/// Monday of the week containing `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let offset = today.weekday().num_days_from_monday();
    today - Days::new(offset as u64)
}

pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

pub fn is_current_week(date: NaiveDate, today: NaiveDate) -> bool {
    let start = week_start(today);
    date >= start && date < start + Days::new(7)
}

pub fn is_current_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

/// `Mar 4, 2025`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Accepts `YYYY-MM-DD` or one of `today`, `yesterday`, `tomorrow`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    match input.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Days::new(1)),
        "tomorrow" => Ok(today + Days::new(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| {
            Error::validation(format!("'{}' is not a date (expected YYYY-MM-DD)", input))
        }),
    }
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m?)?$").expect("duration pattern compiles")
    })
}

/// Parses `90`, `45m`, `2h` or `1h30m` into minutes.
pub fn parse_duration(input: &str) -> Result<i64> {
    let trimmed = input.trim().to_lowercase();
    let invalid = || Error::validation(format!("'{}' is not a duration (try 45m or 1h30m)", input));
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let caps = duration_regex().captures(&trimmed).ok_or_else(invalid)?;
    let hours: i64 = caps
        .get(1)
        .map(|m| m.as_str().parse().map_err(|_| invalid()))
        .transpose()?
        .unwrap_or(0);
    let minutes: i64 = caps
        .get(2)
        .map(|m| m.as_str().parse().map_err(|_| invalid()))
        .transpose()?
        .unwrap_or(0);

    if caps.get(1).is_none() && caps.get(2).is_none() {
        return Err(invalid());
    }
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(invalid)
}
