//! Timestamp encodings and date-key normalization.
//!
//! Every source column carries its timestamps in one declared encoding. The
//! date key is the calendar date as written in the source: no time zone
//! conversion is applied, RFC 3339 offsets are dropped rather than applied, and
//! epoch seconds are read in UTC.

use crate::domain::error::ParseError;
use crate::domain::table::RawTable;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// How a timestamp column is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampEncoding {
    /// Explicit chrono `strftime` pattern, e.g. `%d-%m-%Y %H:%M`.
    Format(String),
    /// ISO-like date or date-time string.
    Iso,
    /// Seconds since the Unix epoch, integer or fractional.
    EpochSeconds,
}

impl TimestampEncoding {
    /// Builds an encoding from a config kind (`iso`, `epoch`, `format`) and an
    /// optional pattern.
    pub fn from_kind(kind: &str, pattern: Option<&str>) -> Result<Self, String> {
        match kind.trim().to_lowercase().as_str() {
            "iso" => Ok(Self::Iso),
            "epoch" | "epoch_seconds" | "unix" => Ok(Self::EpochSeconds),
            "format" => match pattern.map(str::trim).filter(|p| !p.is_empty()) {
                Some(p) => Ok(Self::Format(p.to_string())),
                None => Err("encoding 'format' requires a format pattern".into()),
            },
            other => Err(format!(
                "unknown encoding '{other}' (expected iso, epoch or format)"
            )),
        }
    }
}

impl fmt::Display for TimestampEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(p) => write!(f, "format '{p}'"),
            Self::Iso => write!(f, "iso"),
            Self::EpochSeconds => write!(f, "epoch seconds"),
        }
    }
}

/// Where a dataset keeps its timestamps and how they are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampColumn {
    pub name: String,
    pub encoding: TimestampEncoding,
}

impl TimestampColumn {
    pub fn new(name: impl Into<String>, encoding: TimestampEncoding) -> Self {
        Self {
            name: name.into(),
            encoding,
        }
    }
}

/// What to do with a row whose timestamp or numeric fields do not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Drop the row with a warning and keep going.
    #[default]
    Skip,
    /// Abort on the first failure.
    Strict,
}

impl FromStr for ParsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "strict" | "abort" => Ok(Self::Strict),
            other => Err(format!("unknown parse policy '{other}' (expected skip or strict)")),
        }
    }
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses `value` under `encoding` and returns its calendar date.
///
/// The error string is the reason; callers attach row and column context.
pub fn parse_date_key(value: &str, encoding: &TimestampEncoding) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty timestamp".into());
    }
    match encoding {
        TimestampEncoding::Format(pattern) => parse_with_format(value, pattern),
        TimestampEncoding::Iso => parse_iso(value),
        TimestampEncoding::EpochSeconds => parse_epoch_seconds(value),
    }
}

/// Derives the date key of one table row from its timestamp cell.
pub fn normalize_date(
    table: &RawTable,
    row: usize,
    column: usize,
    encoding: &TimestampEncoding,
) -> Result<NaiveDate, ParseError> {
    let value = table.cell(row, column);
    parse_date_key(value, encoding).map_err(|reason| ParseError {
        source_name: table.source.clone(),
        row: row + 1,
        column: table.headers.get(column).cloned().unwrap_or_default(),
        value: value.to_string(),
        reason: format!("{reason} ({encoding})"),
    })
}

fn parse_with_format(value: &str, pattern: &str) -> Result<NaiveDate, String> {
    match NaiveDateTime::parse_from_str(value, pattern) {
        Ok(dt) => Ok(dt.date()),
        // Date-only patterns cannot produce a NaiveDateTime.
        Err(dt_err) => NaiveDate::parse_from_str(value, pattern)
            .map_err(|_| format!("does not match format '{pattern}': {dt_err}")),
    }
}

fn parse_iso(value: &str) -> Result<NaiveDate, String> {
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local().date())
        .map_err(|_| "not an ISO date or date-time".to_string())
}

fn parse_epoch_seconds(value: &str) -> Result<NaiveDate, String> {
    let secs: i64 = match value.parse::<i64>() {
        Ok(s) => s,
        Err(_) => {
            let f: f64 = value
                .parse()
                .map_err(|_| "not a number of epoch seconds".to_string())?;
            if !f.is_finite() {
                return Err("epoch seconds must be finite".into());
            }
            f.floor() as i64
        }
    };
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| "epoch seconds out of range".to_string())
}
