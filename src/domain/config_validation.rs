//! Configuration validation.
//!
//! Every key is optional; a present key must hold a usable value. The
//! `resolve_*` helpers return the parsed value (or its default) so settings
//! are built from the same checks the validator runs.

use crate::domain::aggregate::{MetricMap, Reduction};
use crate::domain::error::SentimergeError;
use crate::domain::join::DuplicatePolicy;
use crate::domain::merger::{DEFAULT_TRADE_TIMESTAMP_COLUMN, DEFAULT_TRADE_TIMESTAMP_FORMAT};
use crate::domain::timestamp::{ParsePolicy, TimestampColumn, TimestampEncoding};
use crate::domain::trade::TradeField;
use crate::ports::config_port::ConfigPort;

pub const SENTIMENT: &str = "sentiment";
pub const TRADES: &str = "trades";
pub const MERGE: &str = "merge";
pub const AGGREGATE: &str = "aggregate";
pub const OUTPUT: &str = "output";

/// Every `(section, key)` the merger reads.
pub const KNOWN_KEYS: &[(&str, &str)] = &[
    (SENTIMENT, "path"),
    (SENTIMENT, "date_column"),
    (SENTIMENT, "encoding"),
    (SENTIMENT, "format"),
    (TRADES, "path"),
    (TRADES, "timestamp_column"),
    (TRADES, "encoding"),
    (TRADES, "format"),
    (MERGE, "on_parse_error"),
    (MERGE, "duplicate_sentiment"),
    (MERGE, "returns_field"),
    (AGGREGATE, "execution_price"),
    (AGGREGATE, "size_usd"),
    (AGGREGATE, "closed_pnl"),
    (OUTPUT, "path"),
    (OUTPUT, "daily_path"),
    (OUTPUT, "write_daily"),
];

pub fn validate_merge_config(config: &dyn ConfigPort) -> Result<(), SentimergeError> {
    resolve_timestamp_column(config, SENTIMENT, "date_column", "date", TimestampEncoding::Iso)?;
    resolve_timestamp_column(
        config,
        TRADES,
        "timestamp_column",
        DEFAULT_TRADE_TIMESTAMP_COLUMN,
        TimestampEncoding::Format(DEFAULT_TRADE_TIMESTAMP_FORMAT.into()),
    )?;
    resolve_parse_policy(config)?;
    resolve_duplicate_policy(config)?;
    let metrics = resolve_metric_map(config)?;
    resolve_returns_field(config, &metrics)?;
    validate_paths(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SentimergeError {
    SentimergeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Non-empty trimmed value, or `None` when absent or blank.
fn non_blank(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Column name plus encoding for one dataset section. Without an `encoding`
/// key the section default applies; a bare `format` key implies `format`.
pub fn resolve_timestamp_column(
    config: &dyn ConfigPort,
    section: &str,
    column_key: &str,
    default_column: &str,
    default_encoding: TimestampEncoding,
) -> Result<TimestampColumn, SentimergeError> {
    let name = non_blank(config, section, column_key).unwrap_or_else(|| default_column.to_string());
    let pattern = non_blank(config, section, "format");

    let encoding = match non_blank(config, section, "encoding") {
        Some(kind) => TimestampEncoding::from_kind(&kind, pattern.as_deref())
            .map_err(|reason| invalid(section, "encoding", reason))?,
        None => match pattern {
            Some(p) => TimestampEncoding::Format(p),
            None => default_encoding,
        },
    };

    if let TimestampEncoding::Format(p) = &encoding {
        if !p.contains('%') {
            return Err(invalid(section, "format", "format pattern has no % specifiers"));
        }
    }

    Ok(TimestampColumn::new(name, encoding))
}

pub fn resolve_parse_policy(config: &dyn ConfigPort) -> Result<ParsePolicy, SentimergeError> {
    match non_blank(config, MERGE, "on_parse_error") {
        Some(v) => v
            .parse()
            .map_err(|reason: String| invalid(MERGE, "on_parse_error", reason)),
        None => Ok(ParsePolicy::default()),
    }
}

pub fn resolve_duplicate_policy(config: &dyn ConfigPort) -> Result<DuplicatePolicy, SentimergeError> {
    match non_blank(config, MERGE, "duplicate_sentiment") {
        Some(v) => v
            .parse()
            .map_err(|reason: String| invalid(MERGE, "duplicate_sentiment", reason)),
        None => Ok(DuplicatePolicy::default()),
    }
}

/// `[aggregate]` entries keyed by field. With none configured, the default
/// mean price / summed volume map applies.
pub fn resolve_metric_map(config: &dyn ConfigPort) -> Result<MetricMap, SentimergeError> {
    let mut entries = Vec::new();
    for field in TradeField::ALL {
        if let Some(v) = non_blank(config, AGGREGATE, field.key()) {
            let reduction: Reduction = v
                .parse()
                .map_err(|reason: String| invalid(AGGREGATE, field.key(), reason))?;
            entries.push((field, reduction));
        }
    }
    if entries.is_empty() {
        return Ok(MetricMap::default());
    }
    MetricMap::new(entries).map_err(|reason| invalid(AGGREGATE, "*", reason))
}

pub fn resolve_returns_field(
    config: &dyn ConfigPort,
    metrics: &MetricMap,
) -> Result<TradeField, SentimergeError> {
    let field = match non_blank(config, MERGE, "returns_field") {
        Some(v) => v
            .parse()
            .map_err(|reason: String| invalid(MERGE, "returns_field", reason))?,
        None => TradeField::ExecutionPrice,
    };
    if metrics.reduction_for(field).is_none() {
        return Err(invalid(
            MERGE,
            "returns_field",
            format!("'{}' is not aggregated in [aggregate]", field.key()),
        ));
    }
    Ok(field)
}

fn validate_paths(config: &dyn ConfigPort) -> Result<(), SentimergeError> {
    for (section, key) in [
        (SENTIMENT, "path"),
        (TRADES, "path"),
        (OUTPUT, "path"),
        (OUTPUT, "daily_path"),
    ] {
        if let Some(v) = config.get_string(section, key) {
            if v.trim().is_empty() {
                return Err(invalid(section, key, "path must not be empty"));
            }
        }
    }
    Ok(())
}
