//! Daily aggregation of trades.

use crate::domain::dataset::DateKeyed;
use crate::domain::trade::{TradeField, TradeRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a day's values of one field collapse into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    Mean,
    Sum,
    Min,
    Max,
    First,
    Last,
}

impl Reduction {
    /// Reduces a non-empty slice. Returns `None` for an empty one.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let v = match self {
            Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reduction::Sum => values.iter().sum(),
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::First => values[0],
            Reduction::Last => values[values.len() - 1],
        };
        Some(v)
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
            Reduction::Min => "min",
            Reduction::Max => "max",
            Reduction::First => "first",
            Reduction::Last => "last",
        };
        f.write_str(s)
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "avg" | "average" => Ok(Reduction::Mean),
            "sum" | "total" => Ok(Reduction::Sum),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "first" => Ok(Reduction::First),
            "last" => Ok(Reduction::Last),
            other => Err(format!("unknown reduction '{other}'")),
        }
    }
}

/// Ordered field → reduction map. Each field appears at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricMap {
    entries: Vec<(TradeField, Reduction)>,
}

impl MetricMap {
    pub fn new(entries: Vec<(TradeField, Reduction)>) -> Result<Self, String> {
        for (i, (field, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(f, _)| f == field) {
                return Err(format!("field '{}' listed more than once", field.key()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(TradeField, Reduction)] {
        &self.entries
    }

    pub fn reduction_for(&self, field: TradeField) -> Option<Reduction> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, r)| *r)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MetricMap {
    /// Mean execution price and total USD volume per day.
    fn default() -> Self {
        Self {
            entries: vec![
                (TradeField::ExecutionPrice, Reduction::Mean),
                (TradeField::SizeUsd, Reduction::Sum),
            ],
        }
    }
}

/// One row per trading date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub trade_count: usize,
    /// Reduced values in [`MetricMap`] order. Fields with nothing to reduce are absent.
    pub values: Vec<(TradeField, Reduction, f64)>,
}

impl DailyAggregate {
    pub fn get(&self, field: TradeField) -> Option<f64> {
        self.values
            .iter()
            .find(|(f, _, _)| *f == field)
            .map(|(_, _, v)| *v)
    }

    fn get_reduced(&self, field: TradeField, reduction: Reduction) -> Option<f64> {
        self.values
            .iter()
            .find(|(f, r, _)| *f == field && *r == reduction)
            .map(|(_, _, v)| *v)
    }

    pub fn mean_execution_price(&self) -> Option<f64> {
        self.get_reduced(TradeField::ExecutionPrice, Reduction::Mean)
    }

    pub fn total_size_usd(&self) -> Option<f64> {
        self.get_reduced(TradeField::SizeUsd, Reduction::Sum)
    }
}

impl DateKeyed for DailyAggregate {
    fn date_key(&self) -> NaiveDate {
        self.date
    }
}

/// Groups trades by date key and reduces each group per `metrics`.
///
/// Exactly one row per distinct date in `trades`, ascending by date. Dates with
/// no trades do not appear. `First`/`Last` follow input order within a date.
/// Missing values are left out of each reduction; a field with no values on a
/// day has no entry in that day's `values`.
pub fn aggregate_daily(trades: &[TradeRecord], metrics: &MetricMap) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<NaiveDate, Vec<&TradeRecord>> = BTreeMap::new();
    for trade in trades {
        groups.entry(trade.date).or_default().push(trade);
    }

    groups
        .into_iter()
        .map(|(date, day)| {
            let values = metrics
                .entries()
                .iter()
                .filter_map(|&(field, reduction)| {
                    let column: Vec<f64> = day.iter().filter_map(|t| t.field(field)).collect();
                    reduction.apply(&column).map(|v| (field, reduction, v))
                })
                .collect();
            DailyAggregate {
                date,
                trade_count: day.len(),
                values,
            }
        })
        .collect()
}
