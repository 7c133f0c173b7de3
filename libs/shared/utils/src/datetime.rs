//! Date and time normalization for API payloads.
//!
//! The scheduling API speaks three string shapes: `YYYY-MM-DD` for calendar
//! days, `HH:mm:ss` for times of day, and `YYYY-MM-DDTHH:mm:ss` (no offset)
//! for appointment start times. Everything that arrives from forms or from
//! slot records is funnelled through these helpers first.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use thiserror::Error;
use tracing::debug;

pub const API_DATE_FORMAT: &str = "%Y-%m-%d";
pub const API_TIME_FORMAT: &str = "%H:%M:%S";
pub const API_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateTimeError {
    #[error("Unable to parse time format: {0}")]
    InvalidTime(String),

    #[error("Unable to parse date: {0}")]
    InvalidDate(String),

    #[error("Failed to format date and time for API")]
    Format,
}

/// Any of the date representations the UI hands around.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
    Text(String),
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(date_time: NaiveDateTime) -> Self {
        DateInput::DateTime(date_time)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(date_time: DateTime<Tz>) -> Self {
        DateInput::Zoned(date_time.fixed_offset())
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        DateInput::Text(text)
    }
}

impl From<&String> for DateInput {
    fn from(text: &String) -> Self {
        DateInput::Text(text.clone())
    }
}

impl DateInput {
    /// The calendar day as written, ignoring any offset the value carries.
    pub fn calendar_date(&self) -> Result<NaiveDate, DateTimeError> {
        self.resolve(None)
    }

    /// The calendar day as seen from `offset`. Only zoned values are shifted;
    /// bare dates and naive date-times are already local.
    pub fn local_date(&self, offset: FixedOffset) -> Result<NaiveDate, DateTimeError> {
        self.resolve(Some(offset))
    }

    fn resolve(&self, offset: Option<FixedOffset>) -> Result<NaiveDate, DateTimeError> {
        match self {
            DateInput::Date(date) => Ok(*date),
            DateInput::DateTime(date_time) => Ok(date_time.date()),
            DateInput::Zoned(date_time) => Ok(shift(date_time, offset)),
            DateInput::Text(text) => parse_date_text(text, offset),
        }
    }
}

fn shift(date_time: &DateTime<FixedOffset>, offset: Option<FixedOffset>) -> NaiveDate {
    match offset {
        Some(offset) => date_time.with_timezone(&offset).date_naive(),
        None => date_time.date_naive(),
    }
}

fn parse_date_text(text: &str, offset: Option<FixedOffset>) -> Result<NaiveDate, DateTimeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DateTimeError::InvalidDate(text.to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, API_DATE_FORMAT) {
        return Ok(date);
    }

    parse_date_time(trimmed, offset)
        .map(|date_time| date_time.date())
        .map_err(|_| DateTimeError::InvalidDate(text.to_string()))
}

/// Parses an ISO date-time with or without an offset. Values carrying an
/// offset are converted into `offset` when one is given.
pub fn parse_date_time(
    text: &str,
    offset: Option<FixedOffset>,
) -> Result<NaiveDateTime, DateTimeError> {
    let trimmed = text.trim();

    if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(match offset {
            Some(offset) => date_time.with_timezone(&offset).naive_local(),
            None => date_time.naive_local(),
        });
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DateTimeError::InvalidDate(text.to_string()))
}

/// Parses `H:mm`, `HH:mm`, `HH:mm:ss` or a 3-4 digit `Hmm`/`HHmm` string.
pub fn parse_time(input: &str) -> Result<NaiveTime, DateTimeError> {
    let invalid = || DateTimeError::InvalidTime(input.to_string());
    let trimmed = input.trim();

    let (hours, minutes, seconds) = if trimmed.contains(':') {
        let parts: Vec<&str> = trimmed.split(':').collect();
        let well_formed = matches!(parts.len(), 2 | 3)
            && (1..=2).contains(&parts[0].len())
            && parts[1..].iter().all(|p| p.len() == 2);
        if !well_formed {
            return Err(invalid());
        }
        let seconds = parts.get(2).copied().unwrap_or("00");
        (parts[0], parts[1], seconds)
    } else if trimmed.is_ascii() && matches!(trimmed.len(), 3 | 4) {
        let split = trimmed.len() - 2;
        (&trimmed[..split], &trimmed[split..], "00")
    } else {
        return Err(invalid());
    };

    let all_digits = [hours, minutes, seconds]
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if !all_digits {
        return Err(invalid());
    }

    let (h, m, s) = (
        hours.parse::<u32>().map_err(|_| invalid())?,
        minutes.parse::<u32>().map_err(|_| invalid())?,
        seconds.parse::<u32>().map_err(|_| invalid())?,
    );

    NaiveTime::from_hms_opt(h, m, s).ok_or_else(invalid)
}

/// Normalizes any accepted time shape to `HH:mm:ss`.
pub fn normalize_time_format(input: &str) -> Result<String, DateTimeError> {
    parse_time(input).map(|time| time.format(API_TIME_FORMAT).to_string())
}

/// Formats a date as `YYYY-MM-DD`. Applying it to its own output is a no-op.
pub fn format_date_for_api(date: impl Into<DateInput>) -> Result<String, DateTimeError> {
    let date = date.into().calendar_date()?;
    Ok(date.format(API_DATE_FORMAT).to_string())
}

/// Combines a date and a time of day into `YYYY-MM-DDTHH:mm:ss`.
pub fn format_date_time_for_api(
    date: impl Into<DateInput>,
    time: &str,
) -> Result<String, DateTimeError> {
    combine_date_time(date, time).map(|dt| dt.format(API_DATE_TIME_FORMAT).to_string())
}

/// Same as [`format_date_time_for_api`] but returns the parsed value.
pub fn combine_date_time(
    date: impl Into<DateInput>,
    time: &str,
) -> Result<NaiveDateTime, DateTimeError> {
    let date = date.into().calendar_date().map_err(|e| {
        debug!("Date part rejected: {}", e);
        DateTimeError::Format
    })?;
    let time = parse_time(time).map_err(|e| {
        debug!("Time part rejected: {}", e);
        DateTimeError::Format
    })?;

    Ok(date.and_time(time))
}
