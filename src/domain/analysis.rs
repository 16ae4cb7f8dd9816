//! Descriptive summaries over the merged datasets.

use crate::domain::merger::{MergedDaily, MergedTrade};
use crate::domain::sentiment::{Classification, SentimentRecord};
use crate::domain::trade::TradeField;
use std::collections::BTreeMap;

/// Row count per classification, all five classes in ordinal order.
pub fn classification_distribution(sentiment: &[SentimentRecord]) -> Vec<(Classification, usize)> {
    Classification::ALL
        .into_iter()
        .map(|c| {
            let n = sentiment.iter().filter(|s| s.classification == c).count();
            (c, n)
        })
        .collect()
}

/// Mean closed PnL of the trades on each classification's days. Trades with
/// a blank PnL are left out; classes with no PnL values are omitted.
pub fn mean_pnl_by_classification(merged: &[MergedTrade]) -> Vec<(Classification, f64)> {
    let mut sums: BTreeMap<Classification, (f64, usize)> = BTreeMap::new();
    for m in merged {
        let Some(pnl) = m.left.closed_pnl else {
            continue;
        };
        let entry = sums.entry(m.right.classification).or_insert((0.0, 0));
        entry.0 += pnl;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(c, (sum, n))| (c, sum / n as f64))
        .collect()
}

/// Pearson correlation over the positions where both series have a value.
/// `None` with fewer than two complete pairs or zero variance on either side.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()` square.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }
}

/// Pairwise correlation of named columns.
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();
    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Index value, daily returns and daily USD volume, the columns the
/// sentiment/returns correlation is read from.
pub fn daily_correlation_columns(daily: &[MergedDaily]) -> Vec<(String, Vec<Option<f64>>)> {
    vec![
        (
            "value".to_string(),
            daily.iter().map(|d| Some(d.sentiment.value)).collect(),
        ),
        (
            "returns".to_string(),
            daily.iter().map(|d| d.returns).collect(),
        ),
        (
            TradeField::SizeUsd.column_name().to_string(),
            daily.iter().map(|d| d.aggregate.get(TradeField::SizeUsd)).collect(),
        ),
    ]
}
