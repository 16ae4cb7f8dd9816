//! The date-aligning merge pipeline.
//!
//! Load both tables, normalize every row to a date key, aggregate trades per
//! day, inner-join each view with sentiment and derive daily returns.

use crate::domain::aggregate::{aggregate_daily, DailyAggregate, MetricMap};
use crate::domain::dataset::{Dataset, DateKeyed};
use crate::domain::error::SentimergeError;
use crate::domain::export::{merged_daily_table, merged_trades_table};
use crate::domain::join::{inner_join, DuplicatePolicy, Joined};
use crate::domain::returns::compute_returns;
use crate::domain::sentiment::{load_sentiment, SentimentRecord};
use crate::domain::timestamp::{ParsePolicy, TimestampColumn, TimestampEncoding};
use crate::domain::trade::{load_trades, TradeDataset, TradeField, TradeRecord};
use crate::ports::data_port::{DataPort, ExportPort};
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_SENTIMENT_PATH: &str = "fear_greed_index.csv";
pub const DEFAULT_TRADES_PATH: &str = "historical_data.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "processed_data.csv";
pub const DEFAULT_TRADE_TIMESTAMP_COLUMN: &str = "Timestamp IST";
pub const DEFAULT_TRADE_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M";

/// A dataset file and how its timestamps are encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub timestamp: TimestampColumn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeSettings {
    pub sentiment: SourceSpec,
    pub trades: SourceSpec,
    pub parse_policy: ParsePolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub metrics: MetricMap,
    /// Aggregated field the daily returns are computed on.
    pub returns_field: TradeField,
    pub output_path: PathBuf,
    pub daily_output_path: Option<PathBuf>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            sentiment: SourceSpec {
                path: PathBuf::from(DEFAULT_SENTIMENT_PATH),
                timestamp: TimestampColumn::new("date", TimestampEncoding::Iso),
            },
            trades: SourceSpec {
                path: PathBuf::from(DEFAULT_TRADES_PATH),
                timestamp: TimestampColumn::new(
                    DEFAULT_TRADE_TIMESTAMP_COLUMN,
                    TimestampEncoding::Format(DEFAULT_TRADE_TIMESTAMP_FORMAT.into()),
                ),
            },
            parse_policy: ParsePolicy::Skip,
            duplicate_policy: DuplicatePolicy::KeepFirst,
            metrics: MetricMap::default(),
            returns_field: TradeField::ExecutionPrice,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            daily_output_path: None,
        }
    }
}

/// One trade paired with the sentiment of its day.
pub type MergedTrade = Joined<TradeRecord, SentimentRecord>;

/// One trading day paired with its sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDaily {
    pub aggregate: DailyAggregate,
    pub sentiment: SentimentRecord,
    /// Change of the returns field from the previous merged day.
    pub returns: Option<f64>,
}

impl MergedDaily {
    pub fn date(&self) -> NaiveDate {
        self.aggregate.date
    }
}

impl DateKeyed for MergedDaily {
    fn date_key(&self) -> NaiveDate {
        self.aggregate.date
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub sentiment: Dataset<SentimentRecord>,
    pub trades: TradeDataset,
    /// Trade-level inner join, one row per matching trade.
    pub merged: Vec<MergedTrade>,
    /// Daily-aggregate inner join with returns.
    pub daily: Vec<MergedDaily>,
}

impl MergeOutcome {
    /// Distinct dates present in both inputs.
    pub fn shared_dates(&self) -> usize {
        self.daily.len()
    }
}

pub struct DateAligningMerger {
    settings: MergeSettings,
}

impl DateAligningMerger {
    pub fn new(settings: MergeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    pub fn run(&self, data: &dyn DataPort) -> Result<MergeOutcome, SentimergeError> {
        let s = &self.settings;

        let sentiment_table = data.load_table(&s.sentiment.path)?;
        let sentiment = load_sentiment(&sentiment_table, &s.sentiment.timestamp, s.parse_policy)?;

        let trades_table = data.load_table(&s.trades.path)?;
        let trades = load_trades(&trades_table, &s.trades.timestamp, s.parse_policy)?;

        let merged = inner_join(&trades.data.records, &sentiment.records, s.duplicate_policy)?;
        let daily = self.merge_daily(&trades.data.records, &sentiment.records)?;

        if merged.is_empty() {
            tracing::warn!(
                sentiment_rows = sentiment.len(),
                trade_rows = trades.data.len(),
                "no dates in common; merged result is empty"
            );
        } else {
            tracing::info!(
                merged_rows = merged.len(),
                shared_dates = daily.len(),
                "merged trades with sentiment"
            );
        }

        Ok(MergeOutcome {
            sentiment,
            trades,
            merged,
            daily,
        })
    }

    /// Aggregates to one row per day before joining, so sentiment rows are
    /// never fanned out per trade, then derives returns over the joined days.
    pub fn merge_daily(
        &self,
        trades: &[TradeRecord],
        sentiment: &[SentimentRecord],
    ) -> Result<Vec<MergedDaily>, SentimergeError> {
        let s = &self.settings;
        let aggregates = aggregate_daily(trades, &s.metrics);
        let joined = inner_join(&aggregates, sentiment, s.duplicate_policy)?;
        let returns = compute_returns(&joined, |j| j.left.get(s.returns_field))?;

        Ok(joined
            .into_iter()
            .zip(returns)
            .map(|(j, returns)| MergedDaily {
                aggregate: j.left,
                sentiment: j.right,
                returns,
            })
            .collect())
    }

    /// Writes the trade-level merge, and the daily view when configured.
    pub fn export(
        &self,
        outcome: &MergeOutcome,
        sink: &dyn ExportPort,
    ) -> Result<Vec<PathBuf>, SentimergeError> {
        let s = &self.settings;
        let mut written = Vec::new();

        let table = merged_trades_table(outcome, &s.output_path.display().to_string());
        sink.write_table(&table, &s.output_path)?;
        written.push(s.output_path.clone());

        if let Some(daily_path) = &s.daily_output_path {
            let table = merged_daily_table(
                &outcome.daily,
                &outcome.sentiment.extra_columns,
                &s.metrics,
                &daily_path.display().to_string(),
            );
            sink.write_table(&table, daily_path)?;
            written.push(daily_path.clone());
        }

        for path in &written {
            tracing::info!(path = %path.display(), "wrote output");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::Reduction;
    use crate::domain::sentiment::Classification;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
    }

    fn trade(day: u32, price: f64, size: f64) -> TradeRecord {
        TradeRecord {
            timestamp: format!("{day:02}-01-2023 10:00"),
            date: d(day),
            execution_price: Some(price),
            size_usd: Some(size),
            closed_pnl: Some(0.0),
            extra: vec![],
        }
    }

    fn sentiment(day: u32, value: f64, classification: Classification) -> SentimentRecord {
        SentimentRecord {
            date: d(day),
            value,
            classification,
            extra: vec![],
        }
    }

    fn merger() -> DateAligningMerger {
        DateAligningMerger::new(MergeSettings::default())
    }

    #[test]
    fn daily_merge_keeps_only_shared_date() {
        let trades = vec![trade(1, 100.0, 100.0), trade(3, 200.0, 50.0), trade(1, 120.0, 250.0)];
        let sentiment = vec![
            sentiment(1, 40.0, Classification::Fear),
            sentiment(2, 65.0, Classification::Greed),
        ];
        let daily = merger().merge_daily(&trades, &sentiment).unwrap();

        assert_eq!(daily.len(), 1);
        let day = &daily[0];
        assert_eq!(day.date(), d(1));
        assert_eq!(day.aggregate.trade_count, 2);
        assert_relative_eq!(day.aggregate.mean_execution_price().unwrap(), 110.0);
        assert_relative_eq!(day.aggregate.total_size_usd().unwrap(), 350.0);
        assert_eq!(day.sentiment.classification, Classification::Fear);
        assert_eq!(day.returns, None);
    }

    #[test]
    fn returns_follow_joined_days_in_date_order() {
        let trades = vec![trade(3, 99.0, 1.0), trade(1, 100.0, 1.0), trade(2, 110.0, 1.0)];
        let sentiment = vec![
            sentiment(3, 50.0, Classification::Neutral),
            sentiment(1, 40.0, Classification::Fear),
            sentiment(2, 65.0, Classification::Greed),
        ];
        let daily = merger().merge_daily(&trades, &sentiment).unwrap();

        let returns: Vec<Option<f64>> = daily.iter().map(|m| m.returns).collect();
        assert_eq!(returns[0], None);
        assert_relative_eq!(returns[1].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(returns[2].unwrap(), -0.10, epsilon = 1e-12);
    }

    #[test]
    fn returns_skip_gap_days_without_sentiment() {
        let trades = vec![trade(1, 100.0, 1.0), trade(2, 500.0, 1.0), trade(3, 150.0, 1.0)];
        let sentiment = vec![
            sentiment(1, 40.0, Classification::Fear),
            sentiment(3, 50.0, Classification::Neutral),
        ];
        let daily = merger().merge_daily(&trades, &sentiment).unwrap();

        assert_eq!(daily.len(), 2);
        assert_relative_eq!(daily[1].returns.unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn returns_use_the_configured_field() {
        let settings = MergeSettings {
            metrics: MetricMap::new(vec![(TradeField::SizeUsd, Reduction::Sum)]).unwrap(),
            returns_field: TradeField::SizeUsd,
            ..MergeSettings::default()
        };
        let trades = vec![trade(1, 1.0, 100.0), trade(2, 1.0, 80.0), trade(2, 1.0, 70.0)];
        let sentiment = vec![
            sentiment(1, 40.0, Classification::Fear),
            sentiment(2, 45.0, Classification::Fear),
        ];
        let daily = DateAligningMerger::new(settings)
            .merge_daily(&trades, &sentiment)
            .unwrap();

        assert_relative_eq!(daily[1].returns.unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(daily[1].aggregate.mean_execution_price(), None);
    }

    #[test]
    fn daily_merge_applies_duplicate_policy() {
        let trades = vec![trade(1, 100.0, 1.0)];
        let sentiment = vec![
            sentiment(1, 40.0, Classification::Fear),
            sentiment(1, 60.0, Classification::Greed),
        ];

        let daily = merger().merge_daily(&trades, &sentiment).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].sentiment.classification, Classification::Fear);

        let rejecting = DateAligningMerger::new(MergeSettings {
            duplicate_policy: DuplicatePolicy::Reject,
            ..MergeSettings::default()
        });
        let err = rejecting.merge_daily(&trades, &sentiment).unwrap_err();
        assert!(matches!(err, SentimergeError::DuplicateDate { date } if date == d(1)));
    }

    #[test]
    fn no_overlap_is_empty_not_error() {
        let daily = merger()
            .merge_daily(&[trade(5, 1.0, 1.0)], &[sentiment(1, 40.0, Classification::Fear)])
            .unwrap();
        assert!(daily.is_empty());
    }
}
