//! Flat-table renderings of the merged datasets.

use crate::domain::aggregate::MetricMap;
use crate::domain::merger::{MergeOutcome, MergedDaily};
use crate::domain::sentiment::{CLASSIFICATION_COLUMN, VALUE_COLUMN};
use crate::domain::table::RawTable;
use crate::domain::trade::TradeField;

pub const DATE_COLUMN: &str = "date";
pub const TRADE_COUNT_COLUMN: &str = "trade_count";
pub const RETURNS_COLUMN: &str = "returns";

/// Appends `name`, suffixing `_y` (then `_y2`, ...) while it collides with an
/// earlier header.
fn push_unique(headers: &mut Vec<String>, name: &str) {
    let mut candidate = name.to_string();
    let mut n = 1;
    while headers.contains(&candidate) {
        candidate = if n == 1 {
            format!("{name}_y")
        } else {
            format!("{name}_y{n}")
        };
        n += 1;
    }
    headers.push(candidate);
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Trade-level merge: the date key, every trade column, then every sentiment
/// column except its date.
pub fn merged_trades_table(outcome: &MergeOutcome, source: &str) -> RawTable {
    let trades = &outcome.trades;
    let mut headers = vec![DATE_COLUMN.to_string()];
    push_unique(&mut headers, &trades.timestamp_column);
    for field in TradeField::ALL {
        push_unique(&mut headers, field.column_name());
    }
    for col in &trades.data.extra_columns {
        push_unique(&mut headers, col);
    }
    push_unique(&mut headers, VALUE_COLUMN);
    push_unique(&mut headers, CLASSIFICATION_COLUMN);
    for col in &outcome.sentiment.extra_columns {
        push_unique(&mut headers, col);
    }

    let mut table = RawTable::new(source, headers);
    for m in &outcome.merged {
        let mut row = vec![format_date(m.left.date), m.left.timestamp.clone()];
        row.extend(TradeField::ALL.iter().map(|f| format_optional(m.left.field(*f))));
        row.extend(m.left.extra.iter().cloned());
        row.push(m.right.value.to_string());
        row.push(m.right.classification.to_string());
        row.extend(m.right.extra.iter().cloned());
        table.rows.push(row);
    }
    table
}

/// Daily merge: date, trade count, one column per aggregated field, the
/// sentiment columns and `returns` (empty when undefined).
pub fn merged_daily_table(
    daily: &[MergedDaily],
    sentiment_extra_columns: &[String],
    metrics: &MetricMap,
    source: &str,
) -> RawTable {
    let mut headers = vec![DATE_COLUMN.to_string(), TRADE_COUNT_COLUMN.to_string()];
    for (field, _) in metrics.entries() {
        push_unique(&mut headers, field.column_name());
    }
    push_unique(&mut headers, VALUE_COLUMN);
    push_unique(&mut headers, CLASSIFICATION_COLUMN);
    for col in sentiment_extra_columns {
        push_unique(&mut headers, col);
    }
    push_unique(&mut headers, RETURNS_COLUMN);

    let mut table = RawTable::new(source, headers);
    for day in daily {
        let mut row = vec![format_date(day.date()), day.aggregate.trade_count.to_string()];
        row.extend(
            metrics
                .entries()
                .iter()
                .map(|(f, _)| format_optional(day.aggregate.get(*f))),
        );
        row.push(day.sentiment.value.to_string());
        row.push(day.sentiment.classification.to_string());
        row.extend(day.sentiment.extra.iter().cloned());
        row.push(format_optional(day.returns));
        table.rows.push(row);
    }
    table
}
