//! Raw delimited-table representation shared by the file adapters and the domain.

use crate::domain::error::SentimergeError;

/// A header plus string rows, as read from (or written to) a flat file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Name used in diagnostics, usually the file name.
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Like [`column_index`](Self::column_index) but fails with `MissingColumn`.
    pub fn require_column(&self, name: &str) -> Result<usize, SentimergeError> {
        self.column_index(name)
            .ok_or_else(|| SentimergeError::MissingColumn {
                source_name: self.source.clone(),
                column: name.to_string(),
            })
    }

    /// Cell at `(row, col)`; short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Values of one column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some((0..self.rows.len()).map(|r| self.cell(r, idx)).collect())
    }

    /// The first `n` rows, header unchanged.
    pub fn preview(&self, n: usize) -> RawTable {
        RawTable {
            source: self.source.clone(),
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Pads each column to its widest cell, for console display.
pub fn render_text(table: &RawTable) -> String {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut out = String::new();
    let header: Vec<&str> = table.headers.iter().map(|s| s.as_str()).collect();
    out.push_str(&padded_line(&header, &widths));
    out.push('\n');
    for r in 0..table.rows.len() {
        let cells: Vec<&str> = (0..widths.len()).map(|c| table.cell(r, c)).collect();
        out.push_str(&padded_line(&cells, &widths));
        out.push('\n');
    }
    out
}

fn padded_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{c:<w$}", w = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        let mut t = RawTable::new(
            "trades.csv",
            vec!["Timestamp".into(), " Size USD ".into(), "Coin".into()],
        );
        t.rows.push(vec!["1".into(), "100".into(), "BTC".into()]);
        t.rows.push(vec!["2".into(), "250".into()]);
        t
    }

    #[test]
    fn column_lookup_trims_header_whitespace() {
        let t = sample();
        assert_eq!(t.column_index("Size USD"), Some(1));
        assert_eq!(t.column_index("Missing"), None);
    }

    #[test]
    fn require_column_reports_source() {
        let t = sample();
        let err = t.require_column("Closed PnL").unwrap_err();
        assert!(matches!(
            err,
            SentimergeError::MissingColumn { ref source_name, ref column }
                if source_name == "trades.csv" && column == "Closed PnL"
        ));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let t = sample();
        assert_eq!(t.cell(1, 2), "");
        assert_eq!(t.column("Coin").unwrap(), vec!["BTC", ""]);
    }

    #[test]
    fn preview_truncates_rows() {
        let t = sample();
        assert_eq!(t.preview(1).row_count(), 1);
        assert_eq!(t.preview(10).row_count(), 2);
    }

    #[test]
    fn render_text_aligns_columns() {
        let mut t = RawTable::new("x", vec!["a".into(), "bbb".into()]);
        t.rows.push(vec!["long".into(), "1".into()]);
        let text = render_text(&t);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "a     bbb");
        assert_eq!(lines[1], "long  1");
    }
}
