//! Data access port traits.

use crate::domain::error::SentimergeError;
use crate::domain::table::RawTable;
use std::path::Path;

/// Source of flat delimited tables.
pub trait DataPort {
    /// Reads the table at `path`. A missing file is `MissingFile`.
    fn load_table(&self, path: &Path) -> Result<RawTable, SentimergeError>;
}

/// Sink for flat delimited tables.
pub trait ExportPort {
    fn write_table(&self, table: &RawTable, path: &Path) -> Result<(), SentimergeError>;
}
