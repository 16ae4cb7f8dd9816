//! Fear & greed index records.

use crate::domain::dataset::{
    convert_rows, parse_f64, passthrough_columns, sort_by_date, Dataset, DateKeyed,
};
use crate::domain::error::{ParseError, SentimergeError};
use crate::domain::table::RawTable;
use crate::domain::timestamp::{normalize_date, ParsePolicy, TimestampColumn};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

pub const VALUE_COLUMN: &str = "value";
pub const CLASSIFICATION_COLUMN: &str = "classification";

/// Position on the fear-greed scale. Variant order is the ordinal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Classification::ExtremeFear,
        Classification::Fear,
        Classification::Neutral,
        Classification::Greed,
        Classification::ExtremeGreed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Classification::ExtremeFear => "Extreme Fear",
            Classification::Fear => "Fear",
            Classification::Neutral => "Neutral",
            Classification::Greed => "Greed",
            Classification::ExtremeGreed => "Extreme Greed",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        match normalized.as_str() {
            "extreme fear" => Ok(Classification::ExtremeFear),
            "fear" => Ok(Classification::Fear),
            "neutral" => Ok(Classification::Neutral),
            "greed" => Ok(Classification::Greed),
            "extreme greed" => Ok(Classification::ExtremeGreed),
            _ => Err(format!("unknown sentiment classification '{}'", s.trim())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRecord {
    pub date: NaiveDate,
    pub value: f64,
    pub classification: Classification,
    /// Passthrough cells, aligned with [`Dataset::extra_columns`].
    pub extra: Vec<String>,
}

impl DateKeyed for SentimentRecord {
    fn date_key(&self) -> NaiveDate {
        self.date
    }
}

/// Converts a raw sentiment table. The timestamp column, `value` and
/// `classification` must be present; everything else is passed through.
pub fn load_sentiment(
    table: &RawTable,
    date_column: &TimestampColumn,
    policy: ParsePolicy,
) -> Result<Dataset<SentimentRecord>, SentimergeError> {
    let date_idx = table.require_column(&date_column.name)?;
    let value_idx = table.require_column(VALUE_COLUMN)?;
    let class_idx = table.require_column(CLASSIFICATION_COLUMN)?;
    let extras = passthrough_columns(table, &[date_idx, value_idx, class_idx]);

    let (mut records, skipped) = convert_rows(table, policy, |row| {
        let date = normalize_date(table, row, date_idx, &date_column.encoding)?;
        let value = parse_f64(table, row, value_idx)?;
        let raw_class = table.cell(row, class_idx);
        let classification =
            raw_class
                .parse::<Classification>()
                .map_err(|reason| ParseError {
                    source_name: table.source.clone(),
                    row: row + 1,
                    column: CLASSIFICATION_COLUMN.to_string(),
                    value: raw_class.to_string(),
                    reason,
                })?;
        Ok(SentimentRecord {
            date,
            value,
            classification,
            extra: extras
                .iter()
                .map(|(i, _)| table.cell(row, *i).to_string())
                .collect(),
        })
    })?;

    sort_by_date(&mut records);
    tracing::info!(source = %table.source, rows = records.len(), "loaded sentiment");

    Ok(Dataset {
        source: table.source.clone(),
        records,
        extra_columns: extras.into_iter().map(|(_, name)| name).collect(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timestamp::TimestampEncoding;

    fn table(rows: &[[&str; 4]]) -> RawTable {
        let mut t = RawTable::new(
            "fear_greed_index.csv",
            vec![
                "timestamp".into(),
                "value".into(),
                "classification".into(),
                "date".into(),
            ],
        );
        t.rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        t
    }

    fn iso_date() -> TimestampColumn {
        TimestampColumn::new("date", TimestampEncoding::Iso)
    }

    #[test]
    fn classification_parses_case_and_spacing() {
        assert_eq!("Extreme Fear".parse(), Ok(Classification::ExtremeFear));
        assert_eq!(" extreme   greed ".parse(), Ok(Classification::ExtremeGreed));
        assert_eq!("NEUTRAL".parse(), Ok(Classification::Neutral));
        assert!("Panic".parse::<Classification>().is_err());
    }

    #[test]
    fn classification_order_is_ordinal() {
        let mut all = Classification::ALL.to_vec();
        all.reverse();
        all.sort();
        assert_eq!(all, Classification::ALL.to_vec());
        assert_eq!(Classification::Greed.to_string(), "Greed");
    }

    #[test]
    fn load_sorts_and_keeps_passthrough() {
        let t = table(&[
            ["1672617600", "65", "Greed", "2023-01-02"],
            ["1672531200", "40", "Fear", "2023-01-01"],
        ]);
        let ds = load_sentiment(&t, &iso_date(), ParsePolicy::Skip).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.extra_columns, vec!["timestamp"]);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(ds.records[0].classification, Classification::Fear);
        assert_eq!(ds.records[0].extra, vec!["1672531200"]);
        assert!((ds.records[1].value - 65.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_skips_bad_rows() {
        let t = table(&[
            ["1", "40", "Fear", "2023-01-01"],
            ["2", "x", "Fear", "2023-01-02"],
            ["3", "50", "Calm", "2023-01-03"],
            ["4", "50", "Neutral", "01/04/2023"],
        ]);
        let ds = load_sentiment(&t, &iso_date(), ParsePolicy::Skip).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.skipped, 3);
    }

    #[test]
    fn load_strict_fails_on_bad_classification() {
        let t = table(&[["3", "50", "Calm", "2023-01-03"]]);
        let err = load_sentiment(&t, &iso_date(), ParsePolicy::Strict).unwrap_err();
        assert!(matches!(err, SentimergeError::Parse(ref e) if e.column == "classification"));
    }

    #[test]
    fn load_requires_value_column() {
        let t = RawTable::new("s.csv", vec!["date".into(), "classification".into()]);
        let err = load_sentiment(&t, &iso_date(), ParsePolicy::Skip).unwrap_err();
        assert!(matches!(err, SentimergeError::MissingColumn { ref column, .. } if column == "value"));
    }
}
