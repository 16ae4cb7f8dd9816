//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::{
    classification_distribution, correlation_matrix, daily_correlation_columns,
    mean_pnl_by_classification,
};
use crate::domain::config_validation::{
    resolve_duplicate_policy, resolve_metric_map, resolve_parse_policy, resolve_returns_field,
    resolve_timestamp_column, validate_merge_config, KNOWN_KEYS, OUTPUT, SENTIMENT, TRADES,
};
use crate::domain::error::SentimergeError;
use crate::domain::export::merged_trades_table;
use crate::domain::merger::{
    DateAligningMerger, MergeOutcome, MergeSettings, SourceSpec, DEFAULT_OUTPUT_PATH,
    DEFAULT_SENTIMENT_PATH, DEFAULT_TRADES_PATH, DEFAULT_TRADE_TIMESTAMP_COLUMN,
    DEFAULT_TRADE_TIMESTAMP_FORMAT,
};
use crate::domain::table::render_text;
use crate::domain::timestamp::{ParsePolicy, TimestampEncoding};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_DAILY_OUTPUT_PATH: &str = "daily_data.csv";

#[derive(Parser, Debug)]
#[command(
    name = "sentimerge",
    about = "Align trade history with the fear & greed index by date"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge trades with sentiment and write the merged file
    Merge(RunArgs),
    /// Merge, then print descriptive summaries
    Analyze {
        #[command(flatten)]
        run: RunArgs,
        /// Rows of the merged table to preview
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Sentiment CSV (overrides [sentiment] path)
    #[arg(long)]
    pub sentiment: Option<PathBuf>,
    /// Trade CSV (overrides [trades] path)
    #[arg(long)]
    pub trades: Option<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub daily_output: Option<PathBuf>,
    /// Abort on the first unparseable row instead of skipping it
    #[arg(long)]
    pub strict: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Merge(args) => run_merge(&args),
        Command::Analyze { run, preview } => run_analyze(&run, preview),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    let config = FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SentimergeError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    for key in config.unrecognized_keys(KNOWN_KEYS) {
        tracing::warn!(file = %path.display(), key = %key, "ignoring unrecognized config key");
    }
    Ok(config)
}

fn path_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

pub fn build_merge_settings(config: &dyn ConfigPort) -> Result<MergeSettings, SentimergeError> {
    validate_merge_config(config)?;

    let metrics = resolve_metric_map(config)?;
    let returns_field = resolve_returns_field(config, &metrics)?;

    let daily_output_path = match config.get_string(OUTPUT, "daily_path") {
        Some(p) if !p.trim().is_empty() => Some(PathBuf::from(p.trim())),
        _ if config.get_bool(OUTPUT, "write_daily", false) => {
            Some(PathBuf::from(DEFAULT_DAILY_OUTPUT_PATH))
        }
        _ => None,
    };

    Ok(MergeSettings {
        sentiment: SourceSpec {
            path: path_or(config, SENTIMENT, "path", DEFAULT_SENTIMENT_PATH),
            timestamp: resolve_timestamp_column(
                config,
                SENTIMENT,
                "date_column",
                "date",
                TimestampEncoding::Iso,
            )?,
        },
        trades: SourceSpec {
            path: path_or(config, TRADES, "path", DEFAULT_TRADES_PATH),
            timestamp: resolve_timestamp_column(
                config,
                TRADES,
                "timestamp_column",
                DEFAULT_TRADE_TIMESTAMP_COLUMN,
                TimestampEncoding::Format(DEFAULT_TRADE_TIMESTAMP_FORMAT.into()),
            )?,
        },
        parse_policy: resolve_parse_policy(config)?,
        duplicate_policy: resolve_duplicate_policy(config)?,
        metrics,
        returns_field,
        output_path: path_or(config, OUTPUT, "path", DEFAULT_OUTPUT_PATH),
        daily_output_path,
    })
}

/// Command-line flags take precedence over the config file.
pub fn apply_overrides(settings: &mut MergeSettings, args: &RunArgs) {
    if let Some(p) = &args.sentiment {
        settings.sentiment.path = p.clone();
    }
    if let Some(p) = &args.trades {
        settings.trades.path = p.clone();
    }
    if let Some(p) = &args.output {
        settings.output_path = p.clone();
    }
    if let Some(p) = &args.daily_output {
        settings.daily_output_path = Some(p.clone());
    }
    if args.strict {
        settings.parse_policy = ParsePolicy::Strict;
    }
}

pub fn resolve_settings(args: &RunArgs) -> Result<MergeSettings, ExitCode> {
    let config = load_config(args.config.as_ref())?;
    let mut settings = build_merge_settings(&config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    apply_overrides(&mut settings, args);
    Ok(settings)
}

pub fn run_merge(args: &RunArgs) -> ExitCode {
    let settings = match resolve_settings(args) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let adapter = CsvAdapter::default();
    let merger = DateAligningMerger::new(settings);

    let outcome = match merger.run(&adapter) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("{}", merge_summary(&outcome));

    match merger.export(&outcome, &adapter) {
        Ok(paths) => {
            for p in &paths {
                println!("{}", p.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_analyze(args: &RunArgs, preview: usize) -> ExitCode {
    let settings = match resolve_settings(args) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let adapter = CsvAdapter::default();
    let merger = DateAligningMerger::new(settings);

    match merger.run(&adapter) {
        Ok(outcome) => {
            eprintln!("{}", merge_summary(&outcome));
            print!("{}", analysis_report(&outcome, preview));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    match build_merge_settings(&config) {
        Ok(settings) => {
            eprintln!(
                "  sentiment: {} ({}: {})",
                settings.sentiment.path.display(),
                settings.sentiment.timestamp.name,
                settings.sentiment.timestamp.encoding
            );
            eprintln!(
                "  trades:    {} ({}: {})",
                settings.trades.path.display(),
                settings.trades.timestamp.name,
                settings.trades.timestamp.encoding
            );
            eprintln!("  output:    {}", settings.output_path.display());
            for key in config.unrecognized_keys(KNOWN_KEYS) {
                eprintln!("  warning: unrecognized key {key}");
            }
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Row counts for each stage of the merge.
pub fn merge_summary(outcome: &MergeOutcome) -> String {
    let mut lines = vec![
        format!(
            "Sentiment rows: {} ({} skipped)",
            outcome.sentiment.len(),
            outcome.sentiment.skipped
        ),
        format!(
            "Trade rows:     {} ({} skipped)",
            outcome.trades.data.len(),
            outcome.trades.data.skipped
        ),
        format!("Merged rows:    {}", outcome.merged.len()),
        format!("Shared dates:   {}", outcome.shared_dates()),
    ];
    if outcome.merged.is_empty() {
        lines.push("No dates in common between the two inputs.".to_string());
    }
    lines.join("\n")
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

/// Text report of the merged data: preview, class distribution, PnL by class
/// and the sentiment/returns/volume correlation matrix.
pub fn analysis_report(outcome: &MergeOutcome, preview: usize) -> String {
    let mut out = String::new();

    let merged = merged_trades_table(outcome, "merged");
    out.push_str("=== Merged Data Preview ===\n");
    out.push_str(&render_text(&merged.preview(preview)));

    out.push_str("\n=== Sentiment Distribution ===\n");
    for (class, count) in classification_distribution(&outcome.sentiment.records) {
        out.push_str(&format!("  {:<14} {}\n", class.label(), count));
    }

    out.push_str("\n=== Average Closed PnL by Sentiment ===\n");
    let pnl = mean_pnl_by_classification(&outcome.merged);
    if pnl.is_empty() {
        out.push_str("  (no merged trades)\n");
    }
    for (class, mean) in pnl {
        out.push_str(&format!("  {:<14} {:.2}\n", class.label(), mean));
    }

    out.push_str("\n=== Correlation Matrix ===\n");
    let matrix = correlation_matrix(&daily_correlation_columns(&outcome.daily));
    out.push_str(&format!("  {:<10}", ""));
    for label in &matrix.labels {
        out.push_str(&format!(" {:>10}", label));
    }
    out.push('\n');
    for (label, row) in matrix.labels.iter().zip(&matrix.values) {
        out.push_str(&format!("  {:<10}", label));
        for v in row {
            out.push_str(&format!(" {:>10}", fmt_opt(*v)));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::MetricMap;
    use crate::domain::join::DuplicatePolicy;
    use crate::domain::trade::TradeField;

    #[test]
    fn cli_parses_merge_flags() {
        let cli = Cli::try_parse_from([
            "sentimerge",
            "merge",
            "--trades",
            "t.csv",
            "--strict",
            "-o",
            "out.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Merge(args) => {
                assert_eq!(args.trades, Some(PathBuf::from("t.csv")));
                assert_eq!(args.output, Some(PathBuf::from("out.csv")));
                assert!(args.strict);
                assert!(args.config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_analyze_preview() {
        let cli = Cli::try_parse_from(["sentimerge", "analyze", "--preview", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Analyze { preview: 3, .. }));
    }

    #[test]
    fn defaults_without_config() {
        let settings = build_merge_settings(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(settings, MergeSettings::default());
    }

    #[test]
    fn write_daily_uses_default_path() {
        let config = FileConfigAdapter::from_string("[output]\nwrite_daily = yes\n").unwrap();
        let settings = build_merge_settings(&config).unwrap();
        assert_eq!(
            settings.daily_output_path,
            Some(PathBuf::from(DEFAULT_DAILY_OUTPUT_PATH))
        );
    }

    #[test]
    fn config_values_and_overrides() {
        let config = FileConfigAdapter::from_string(
            r#"
[trades]
path = raw/trades.csv
timestamp_column = Timestamp
encoding = epoch

[merge]
duplicate_sentiment = last

[aggregate]
execution_price = mean
closed_pnl = sum
"#,
        )
        .unwrap();
        let mut settings = build_merge_settings(&config).unwrap();
        assert_eq!(settings.trades.path, PathBuf::from("raw/trades.csv"));
        assert_eq!(settings.trades.timestamp.encoding, TimestampEncoding::EpochSeconds);
        assert_eq!(settings.duplicate_policy, DuplicatePolicy::KeepLast);
        assert_eq!(settings.returns_field, TradeField::ExecutionPrice);
        assert_ne!(settings.metrics, MetricMap::default());

        let args = RunArgs {
            sentiment: Some(PathBuf::from("fg.csv")),
            daily_output: Some(PathBuf::from("d.csv")),
            strict: true,
            ..RunArgs::default()
        };
        apply_overrides(&mut settings, &args);
        assert_eq!(settings.sentiment.path, PathBuf::from("fg.csv"));
        assert_eq!(settings.trades.path, PathBuf::from("raw/trades.csv"));
        assert_eq!(settings.daily_output_path, Some(PathBuf::from("d.csv")));
        assert_eq!(settings.parse_policy, ParsePolicy::Strict);
    }

    fn empty_outcome() -> MergeOutcome {
        use crate::domain::dataset::Dataset;
        use crate::domain::trade::TradeDataset;

        MergeOutcome {
            sentiment: Dataset {
                source: "fear_greed_index.csv".into(),
                records: vec![],
                extra_columns: vec![],
                skipped: 2,
            },
            trades: TradeDataset {
                timestamp_column: "Timestamp IST".into(),
                data: Dataset {
                    source: "historical_data.csv".into(),
                    records: vec![],
                    extra_columns: vec![],
                    skipped: 0,
                },
            },
            merged: vec![],
            daily: vec![],
        }
    }

    #[test]
    fn summary_lines_for_empty_merge() {
        let summary = merge_summary(&empty_outcome());
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Sentiment rows: 0 (2 skipped)");
        assert_eq!(lines[2], "Merged rows:    0");
        assert_eq!(lines[4], "No dates in common between the two inputs.");
        assert!(!summary.ends_with('\n'));
    }

    #[test]
    fn report_for_empty_merge() {
        let report = analysis_report(&empty_outcome(), 5);
        assert!(report.starts_with("=== Merged Data Preview ===\ndate"));
        assert!(report.contains("  (no merged trades)\n"));
        assert!(report.contains("  Extreme Fear   0\n"));
        assert!(report.ends_with("-\n"));
    }

    #[test]
    fn invalid_config_surfaces_error() {
        let config = FileConfigAdapter::from_string("[merge]\non_parse_error = ignore\n").unwrap();
        let err = build_merge_settings(&config).unwrap_err();
        assert!(matches!(err, SentimergeError::ConfigInvalid { ref key, .. } if key == "on_parse_error"));
    }
}
