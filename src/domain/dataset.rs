//! Typed datasets built from raw tables, and the row-level parse policy.

use crate::domain::error::{ParseError, SentimergeError};
use crate::domain::table::RawTable;
use crate::domain::timestamp::ParsePolicy;
use chrono::NaiveDate;

/// Anything carrying a calendar-date join key.
pub trait DateKeyed {
    fn date_key(&self) -> NaiveDate;
}

/// Records converted from one raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    pub source: String,
    pub records: Vec<T>,
    /// Input columns copied through untouched, in source order.
    pub extra_columns: Vec<String>,
    /// Rows dropped under [`ParsePolicy::Skip`].
    pub skipped: usize,
}

impl<T> Dataset<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: DateKeyed> Dataset<T> {
    /// Stable sort by date key; rows sharing a date keep source order.
    pub fn sort_by_date(&mut self) {
        sort_by_date(&mut self.records);
    }
}

pub fn sort_by_date<T: DateKeyed>(records: &mut [T]) {
    records.sort_by_key(|r| r.date_key());
}

/// Index of the first element whose date is earlier than its predecessor's.
pub fn first_unsorted<T: DateKeyed>(records: &[T]) -> Option<usize> {
    records
        .windows(2)
        .position(|w| w[1].date_key() < w[0].date_key())
        .map(|i| i + 1)
}

/// Converts every row with `convert`, dropping or failing on parse errors per
/// `policy`. Returns the converted records and the number skipped.
pub(crate) fn convert_rows<T>(
    table: &RawTable,
    policy: ParsePolicy,
    mut convert: impl FnMut(usize) -> Result<T, ParseError>,
) -> Result<(Vec<T>, usize), SentimergeError> {
    let mut records = Vec::with_capacity(table.row_count());
    let mut skipped = 0usize;

    for row in 0..table.row_count() {
        match convert(row) {
            Ok(record) => records.push(record),
            Err(e) => match policy {
                ParsePolicy::Strict => return Err(e.into()),
                ParsePolicy::Skip => {
                    tracing::warn!("skipping row: {e}");
                    skipped += 1;
                }
            },
        }
    }

    if skipped > 0 {
        tracing::warn!(
            source = %table.source,
            skipped,
            kept = records.len(),
            "dropped rows that failed to parse"
        );
    }
    Ok((records, skipped))
}

/// Parses a numeric cell. Empty cells are an error.
pub(crate) fn parse_f64(table: &RawTable, row: usize, column: usize) -> Result<f64, ParseError> {
    let value = table.cell(row, column).trim();
    value.parse::<f64>().map_err(|_| ParseError {
        source_name: table.source.clone(),
        row: row + 1,
        column: table.headers.get(column).cloned().unwrap_or_default(),
        value: value.to_string(),
        reason: "not a number".into(),
    })
}

/// Parses a numeric cell that may be blank. Blank is `None`; anything else
/// must be a number.
pub(crate) fn parse_optional_f64(
    table: &RawTable,
    row: usize,
    column: usize,
) -> Result<Option<f64>, ParseError> {
    if table.cell(row, column).trim().is_empty() {
        return Ok(None);
    }
    parse_f64(table, row, column).map(Some)
}

/// Header indices not in `used`, with their names.
pub(crate) fn passthrough_columns(table: &RawTable, used: &[usize]) -> Vec<(usize, String)> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !used.contains(i))
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect()
}
