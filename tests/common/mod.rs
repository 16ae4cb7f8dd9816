#![allow(dead_code)]

use chrono::NaiveDate;
use sentimerge::domain::error::SentimergeError;
use sentimerge::domain::table::RawTable;
use sentimerge::ports::data_port::{DataPort, ExportPort};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory tables keyed by path; written tables are captured.
pub struct MockDataPort {
    pub tables: HashMap<PathBuf, RawTable>,
    pub written: RefCell<Vec<(PathBuf, RawTable)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            written: RefCell::new(Vec::new()),
        }
    }

    pub fn with_csv(mut self, path: &str, text: &str) -> Self {
        self.tables.insert(PathBuf::from(path), table_from_csv(path, text));
        self
    }

    pub fn written_table(&self, path: &str) -> Option<RawTable> {
        self.written
            .borrow()
            .iter()
            .find(|(p, _)| p == Path::new(path))
            .map(|(_, t)| t.clone())
    }
}

impl DataPort for MockDataPort {
    fn load_table(&self, path: &Path) -> Result<RawTable, SentimergeError> {
        self.tables
            .get(path)
            .cloned()
            .ok_or_else(|| SentimergeError::MissingFile {
                path: path.display().to_string(),
            })
    }
}

impl ExportPort for MockDataPort {
    fn write_table(&self, table: &RawTable, path: &Path) -> Result<(), SentimergeError> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), table.clone()));
        Ok(())
    }
}

/// Parses simple comma-separated text (no quoting), ignoring blank lines and
/// leading indentation.
pub fn table_from_csv(source: &str, text: &str) -> RawTable {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let headers = lines
        .next()
        .map(|h| h.split(',').map(String::from).collect())
        .unwrap_or_default();
    let mut table = RawTable::new(source, headers);
    table.rows = lines
        .map(|l| l.split(',').map(String::from).collect())
        .collect();
    table
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub const SENTIMENT_CSV: &str = "
    timestamp,value,classification,date
    1672531200,40,Fear,2023-01-01
    1672617600,65,Greed,2023-01-02
";

/// Two trades on 2023-01-01 and one on 2023-01-03, `Timestamp IST` encoding.
pub const TRADES_IST_CSV: &str = "
    Account,Coin,Execution Price,Size USD,Side,Timestamp IST,Closed PnL
    0xabc,BTC,100,100,BUY,01-01-2023 10:15,0
    0xabc,BTC,120,250,SELL,01-01-2023 21:40,12.5
    0xdef,ETH,200,80,BUY,03-01-2023 08:00,-3
";

/// Same trades with epoch-second `Timestamp`.
pub const TRADES_EPOCH_CSV: &str = "
    Account,Coin,Execution Price,Size USD,Side,Timestamp,Closed PnL
    0xabc,BTC,100,100,BUY,1672568100,0
    0xabc,BTC,120,250,SELL,1672609200,12.5
    0xdef,ETH,200,80,BUY,1672732800,-3
";
