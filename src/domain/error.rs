//! Domain error types.

use chrono::NaiveDate;

/// A value that does not conform to its declared column type or timestamp encoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error in {source_name} row {row}, column '{column}': {reason} (value: '{value}')")]
pub struct ParseError {
    pub source_name: String,
    /// 1-based data row number, header excluded.
    pub row: usize,
    pub column: String,
    pub value: String,
    pub reason: String,
}

/// Top-level error type for sentimerge.
#[derive(Debug, thiserror::Error)]
pub enum SentimergeError {
    #[error("input file not found: {path}")]
    MissingFile { path: String },

    #[error("missing column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("csv error in {source_name}: {reason}")]
    Csv { source_name: String, reason: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("duplicate sentiment rows for {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("series is not sorted by date at position {position}")]
    UnsortedSeries { position: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SentimergeError> for std::process::ExitCode {
    fn from(err: &SentimergeError) -> Self {
        let code: u8 = match err {
            SentimergeError::Io(_) => 1,
            SentimergeError::ConfigParse { .. } | SentimergeError::ConfigInvalid { .. } => 2,
            SentimergeError::MissingFile { .. }
            | SentimergeError::MissingColumn { .. }
            | SentimergeError::Csv { .. } => 3,
            SentimergeError::Parse(_)
            | SentimergeError::DuplicateDate { .. }
            | SentimergeError::UnsortedSeries { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
