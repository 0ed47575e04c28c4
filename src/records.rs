//! Raw rows and the canonical [`ActivityRecord`].
//!
//! A [`RawRow`] is whatever the CSV parser or the backend handed us: a bag of
//! column name to string. [`normalize`] turns one into a typed record or
//! reports why it had to be dropped.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dates::{Convention, DEFAULT_FORMATS, match_first};
use crate::stats::BatchStats;

/// One untyped input row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(HashMap<String, String>);

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Column naming of an input batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Headings of the downloadable template CSV.
    Upload,
    /// snake_case columns of the shared backend table.
    Stored,
}

/// Column names for one [`Schema`]. `local_authority` is `None` when the
/// schema has no such column and the value must come from enrichment.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub activity: &'static str,
    pub age_range: &'static str,
    pub date: &'static str,
    pub number_of_people: &'static str,
    pub postcode: &'static str,
    pub type_of_insight: &'static str,
    pub location: &'static str,
    pub local_authority: Option<&'static str>,
}

/// Header row of the upload template, in file order.
pub const UPLOAD_HEADERS: [&str; 7] = [
    "Activity",
    "Age Range",
    "Date",
    "Number of people",
    "Postcode",
    "Type of insight",
    "What approximate location does this relate to?",
];

impl Schema {
    pub fn columns(self) -> Columns {
        match self {
            Schema::Upload => Columns {
                activity: UPLOAD_HEADERS[0],
                age_range: UPLOAD_HEADERS[1],
                date: UPLOAD_HEADERS[2],
                number_of_people: UPLOAD_HEADERS[3],
                postcode: UPLOAD_HEADERS[4],
                type_of_insight: UPLOAD_HEADERS[5],
                location: UPLOAD_HEADERS[6],
                local_authority: None,
            },
            Schema::Stored => Columns {
                activity: "activity",
                age_range: "age_range",
                date: "date",
                number_of_people: "number_of_people",
                postcode: "postcode",
                type_of_insight: "type_of_insight",
                location: "location",
                local_authority: Some("local_authority"),
            },
        }
    }
}

/// A categorical field of [`ActivityRecord`] that views can be keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Field {
    Activity,
    LocalAuthority,
    Location,
    TypeOfInsight,
    AgeRange,
}

/// Canonical, typed activity record. `date` is always a real calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub activity: String,
    pub local_authority: String,
    pub location: String,
    pub type_of_insight: String,
    pub age_range: String,
    pub date: NaiveDate,
    pub number_of_people: u64,
    pub postcode: Option<String>,
}

impl ActivityRecord {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Activity => &self.activity,
            Field::LocalAuthority => &self.local_authority,
            Field::Location => &self.location,
            Field::TypeOfInsight => &self.type_of_insight,
            Field::AgeRange => &self.age_range,
        }
    }
}

/// Why a row never became a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("unparseable date {value:?}")]
    UnparseableDate { value: String },
}

/// Parses a people count the way a leading-integer parse does: surrounding
/// whitespace and an optional `+` are allowed, and the leading run of digits
/// is taken (`"2.5"` is 2, `"12 people"` is 12). Counts beyond `u64::MAX`
/// saturate. Missing or empty values are 0; negatives and values without a
/// leading digit are coerced to 0.
///
/// Returns the count and whether anything had to be discarded or coerced.
pub fn parse_count(value: Option<&str>) -> (u64, bool) {
    let s = match value.map(str::trim) {
        None | Some("") => return (0, false),
        Some(s) => s,
    };

    let unsigned = s.strip_prefix('+').unwrap_or(s);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];
    if digits.is_empty() {
        return (0, true);
    }

    let trailing = digits_end < unsigned.len();
    match digits.parse::<u64>() {
        Ok(n) => (n, trailing),
        Err(_) => (u64::MAX, true),
    }
}

fn text(row: &RawRow, column: &str) -> String {
    row.get(column).map(str::trim).unwrap_or_default().to_string()
}

/// Outcome details the batch report cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowNotes {
    pub count_coerced: bool,
    pub month_first: bool,
}

/// Converts one raw row into an [`ActivityRecord`].
///
/// # Errors
///
/// [`NormalizeError::UnparseableDate`] when no candidate format matches the
/// date column. A bad count is never an error; it normalizes to 0.
pub fn normalize(row: &RawRow, schema: Schema) -> Result<ActivityRecord, NormalizeError> {
    normalize_with_notes(row, schema).map(|(record, _)| record)
}

pub fn normalize_with_notes(
    row: &RawRow,
    schema: Schema,
) -> Result<(ActivityRecord, RowNotes), NormalizeError> {
    let cols = schema.columns();

    let date_text = row.get(cols.date).unwrap_or_default();
    let (date, format) =
        match_first(date_text, DEFAULT_FORMATS).map_err(|e| NormalizeError::UnparseableDate {
            value: e.input,
        })?;

    let (number_of_people, count_coerced) = parse_count(row.get(cols.number_of_people));

    let postcode = Some(text(row, cols.postcode)).filter(|p| !p.is_empty());
    let local_authority = cols
        .local_authority
        .map(|c| text(row, c))
        .unwrap_or_default();

    let record = ActivityRecord {
        activity: text(row, cols.activity),
        local_authority,
        location: text(row, cols.location),
        type_of_insight: text(row, cols.type_of_insight),
        age_range: text(row, cols.age_range),
        date,
        number_of_people,
        postcode,
    };

    let notes = RowNotes {
        count_coerced,
        month_first: format.convention == Convention::MonthFirst,
    };

    Ok((record, notes))
}

/// Records that survived normalization plus what happened to the rest.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<ActivityRecord>,
    pub stats: BatchStats,
}

/// Normalizes every row independently. Dropped rows are logged and counted;
/// they never stop the rest of the batch.
pub fn normalize_batch(rows: &[RawRow], schema: Schema) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(rows.len()),
        stats: BatchStats::default(),
    };

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        batch.stats.total_rows += 1;

        match normalize_with_notes(row, schema) {
            Ok((record, notes)) => {
                if notes.count_coerced {
                    debug!(
                        row = row_number,
                        value = row.get(schema.columns().number_of_people).unwrap_or_default(),
                        "Non-numeric people count treated as 0"
                    );
                    batch.stats.coerced_counts += 1;
                }
                if notes.month_first {
                    warn!(
                        row = row_number,
                        date = %record.date,
                        "Date only parsed as month-first, flagged for review"
                    );
                    batch.stats.month_first_dates += 1;
                }
                batch.records.push(record);
            }
            Err(NormalizeError::UnparseableDate { value }) => {
                warn!(row = row_number, date = %value, "Dropping row with invalid date");
                batch.stats.record_drop(row_number, value);
            }
        }
    }

    batch.stats.kept_rows = batch.records.len();
    batch
}
