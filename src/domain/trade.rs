//! Historical trade records.

use crate::domain::dataset::{
    convert_rows, parse_optional_f64, passthrough_columns, sort_by_date, Dataset, DateKeyed,
};
use crate::domain::error::SentimergeError;
use crate::domain::table::RawTable;
use crate::domain::timestamp::{normalize_date, ParsePolicy, TimestampColumn};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Numeric trade columns the merger interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TradeField {
    ExecutionPrice,
    SizeUsd,
    ClosedPnl,
}

impl TradeField {
    pub const ALL: [TradeField; 3] = [
        TradeField::ExecutionPrice,
        TradeField::SizeUsd,
        TradeField::ClosedPnl,
    ];

    /// Header of the column in the trade file.
    pub fn column_name(self) -> &'static str {
        match self {
            TradeField::ExecutionPrice => "Execution Price",
            TradeField::SizeUsd => "Size USD",
            TradeField::ClosedPnl => "Closed PnL",
        }
    }

    /// Config key form, e.g. `execution_price`.
    pub fn key(self) -> &'static str {
        match self {
            TradeField::ExecutionPrice => "execution_price",
            TradeField::SizeUsd => "size_usd",
            TradeField::ClosedPnl => "closed_pnl",
        }
    }
}

impl fmt::Display for TradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for TradeField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(' ', "_");
        TradeField::ALL
            .into_iter()
            .find(|f| f.key() == wanted)
            .ok_or_else(|| format!("unknown trade field '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    /// Timestamp exactly as it appeared in the source.
    pub timestamp: String,
    pub date: NaiveDate,
    /// Numeric fields are `None` when the cell was blank.
    pub execution_price: Option<f64>,
    pub size_usd: Option<f64>,
    pub closed_pnl: Option<f64>,
    /// Passthrough cells, aligned with [`Dataset::extra_columns`].
    pub extra: Vec<String>,
}

impl TradeRecord {
    pub fn field(&self, field: TradeField) -> Option<f64> {
        match field {
            TradeField::ExecutionPrice => self.execution_price,
            TradeField::SizeUsd => self.size_usd,
            TradeField::ClosedPnl => self.closed_pnl,
        }
    }
}

impl DateKeyed for TradeRecord {
    fn date_key(&self) -> NaiveDate {
        self.date
    }
}

/// Trades plus the name of the column their timestamps came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDataset {
    pub timestamp_column: String,
    pub data: Dataset<TradeRecord>,
}

/// Converts a raw trade table, deriving each row's date key from
/// `timestamp_column`. Rows come back sorted by date, source order kept
/// within a date.
pub fn load_trades(
    table: &RawTable,
    timestamp_column: &TimestampColumn,
    policy: ParsePolicy,
) -> Result<TradeDataset, SentimergeError> {
    let ts_idx = table.require_column(&timestamp_column.name)?;
    let price_idx = table.require_column(TradeField::ExecutionPrice.column_name())?;
    let size_idx = table.require_column(TradeField::SizeUsd.column_name())?;
    let pnl_idx = table.require_column(TradeField::ClosedPnl.column_name())?;
    let extras = passthrough_columns(table, &[ts_idx, price_idx, size_idx, pnl_idx]);

    let (mut records, skipped) = convert_rows(table, policy, |row| {
        Ok(TradeRecord {
            timestamp: table.cell(row, ts_idx).to_string(),
            date: normalize_date(table, row, ts_idx, &timestamp_column.encoding)?,
            execution_price: parse_optional_f64(table, row, price_idx)?,
            size_usd: parse_optional_f64(table, row, size_idx)?,
            closed_pnl: parse_optional_f64(table, row, pnl_idx)?,
            extra: extras
                .iter()
                .map(|(i, _)| table.cell(row, *i).to_string())
                .collect(),
        })
    })?;

    sort_by_date(&mut records);
    tracing::info!(source = %table.source, rows = records.len(), "loaded trades");

    Ok(TradeDataset {
        timestamp_column: timestamp_column.name.clone(),
        data: Dataset {
            source: table.source.clone(),
            records,
            extra_columns: extras.into_iter().map(|(_, name)| name).collect(),
            skipped,
        },
    })
}
