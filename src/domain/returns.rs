//! Fractional change between consecutive dated values.

use crate::domain::dataset::{first_unsorted, DateKeyed};
use crate::domain::error::SentimergeError;

/// Fractional change of each value from its predecessor.
///
/// The first element has no predecessor and is `None`. A missing value on
/// either side, or a zero predecessor, also gives `None`.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let change = if i == 0 {
            None
        } else {
            match (values[i - 1], values[i]) {
                (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev),
                _ => None,
            }
        };
        out.push(change);
    }
    out
}

/// Returns of `column` over date-ordered `rows`.
///
/// Fails with `UnsortedSeries` rather than computing returns over rows that
/// are out of date order.
pub fn compute_returns<T: DateKeyed>(
    rows: &[T],
    column: impl Fn(&T) -> Option<f64>,
) -> Result<Vec<Option<f64>>, SentimergeError> {
    if let Some(position) = first_unsorted(rows) {
        return Err(SentimergeError::UnsortedSeries { position });
    }
    let values: Vec<Option<f64>> = rows.iter().map(column).collect();
    Ok(pct_change(&values))
}
