//! Multi-format calendar date parsing.
//!
//! Uploaded sheets carry dates in whatever shape the contributor's
//! spreadsheet produced. [`parse_first_matching`] walks an ordered list of
//! candidate formats and returns the first full, valid match.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Which reading convention a format follows. Used to flag dates that only
/// parsed once the day-first patterns had been exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    DayFirst,
    MonthFirst,
    YearFirst,
}

/// One candidate date format in `chrono` strftime syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    pub pattern: &'static str,
    pub convention: Convention,
    /// Pattern includes a time of day; only the calendar date is kept.
    pub with_time: bool,
}

impl DateFormat {
    pub const fn date(pattern: &'static str, convention: Convention) -> Self {
        Self {
            pattern,
            convention,
            with_time: false,
        }
    }

    pub const fn datetime(pattern: &'static str, convention: Convention) -> Self {
        Self {
            pattern,
            convention,
            with_time: true,
        }
    }

    fn parse(&self, input: &str) -> Option<NaiveDate> {
        if self.with_time {
            NaiveDateTime::parse_from_str(input, self.pattern)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(input, self.pattern).ok()
        }
    }
}

/// Candidate formats in priority order. Day-first wins over month-first for
/// ambiguous strings such as `01/02/2023`.
pub const DEFAULT_FORMATS: &[DateFormat] = &[
    DateFormat::date("%d/%m/%Y", Convention::DayFirst),
    DateFormat::date("%d-%m-%Y", Convention::DayFirst),
    DateFormat::date("%e/%-m/%Y", Convention::DayFirst),
    DateFormat::date("%m/%d/%Y", Convention::MonthFirst),
    DateFormat::date("%m-%d-%Y", Convention::MonthFirst),
    DateFormat::date("%-m/%e/%Y", Convention::MonthFirst),
    DateFormat::date("%Y/%m/%d", Convention::YearFirst),
    DateFormat::date("%Y-%m-%d", Convention::YearFirst),
    DateFormat::date("%Y/%-m/%e", Convention::YearFirst),
    DateFormat::datetime("%d/%m/%Y %H:%M:%S", Convention::DayFirst),
    DateFormat::datetime("%m/%d/%Y %I:%M:%S %p", Convention::MonthFirst),
    DateFormat::datetime("%Y-%m-%dT%H:%M:%S", Convention::YearFirst),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no candidate date format matched {input:?}")]
pub struct DateParseError {
    pub input: String,
}

/// Returns the parsed date together with the format that produced it.
pub fn match_first<'a>(
    input: &str,
    formats: &'a [DateFormat],
) -> Result<(NaiveDate, &'a DateFormat), DateParseError> {
    let trimmed = input.trim();
    if !trimmed.is_empty() {
        for format in formats {
            if let Some(date) = format.parse(trimmed) {
                return Ok((date, format));
            }
        }
    }

    Err(DateParseError {
        input: input.to_string(),
    })
}

/// Parses `input` with the first format in `formats` that fully and validly
/// matches it.
///
/// # Errors
///
/// Returns [`DateParseError`] when no format matches. Callers must not
/// substitute a default date.
pub fn parse_first_matching(
    input: &str,
    formats: &[DateFormat],
) -> Result<NaiveDate, DateParseError> {
    match_first(input, formats).map(|(date, _)| date)
}
