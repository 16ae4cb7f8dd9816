//! CSV file adapter for reading input tables and writing merged output.

use crate::domain::error::SentimergeError;
use crate::domain::table::RawTable;
use crate::ports::data_port::{DataPort, ExportPort};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads and writes comma-delimited files with a header row. Relative paths
/// resolve against `base_path`.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl DataPort for CsvAdapter {
    fn load_table(&self, path: &Path) -> Result<RawTable, SentimergeError> {
        let full = self.resolve(path);
        let source = path.display().to_string();

        let file = File::open(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SentimergeError::MissingFile {
                path: full.display().to_string(),
            },
            _ => SentimergeError::Io(e),
        })?;

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let csv_err = |e: csv::Error| SentimergeError::Csv {
            source_name: source.clone(),
            reason: e.to_string(),
        };

        let mut headers: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if let Some(first) = headers.first_mut() {
            *first = first.trim_start_matches('\u{feff}').to_string();
        }

        let mut table = RawTable::new(source.clone(), headers);
        for result in rdr.records() {
            let record = result.map_err(csv_err)?;
            table.rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        tracing::debug!(path = %full.display(), rows = table.row_count(), "read csv");
        Ok(table)
    }
}

impl ExportPort for CsvAdapter {
    fn write_table(&self, table: &RawTable, path: &Path) -> Result<(), SentimergeError> {
        let full = self.resolve(path);
        let csv_err = |e: csv::Error| SentimergeError::Csv {
            source_name: full.display().to_string(),
            reason: e.to_string(),
        };

        let mut wtr = csv::Writer::from_path(&full).map_err(csv_err)?;
        wtr.write_record(&table.headers).map_err(csv_err)?;
        for row in &table.rows {
            wtr.write_record(row).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
