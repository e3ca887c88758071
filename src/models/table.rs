use super::row::{Cell, Row};
use serde::Serialize;
use std::collections::HashSet;

/// All rows produced by one batch run plus the union of their columns.
///
/// Columns are listed in first-seen order across rows; a row that does not
/// carry a column reads as [`Cell::Absent`] there.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl BatchTable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut columns = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if seen.insert(key) {
                    columns.push(key.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> Cell<'_> {
        self.rows
            .get(row)
            .map(|r| r.cell(column))
            .unwrap_or(Cell::Absent)
    }
}
