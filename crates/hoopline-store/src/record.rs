//! Tabular record sets as returned by the remote source

use serde::{Deserialize, Serialize};
use serde_json::Value;

static NULL: Value = Value::Null;

/// One table: named columns plus rows of JSON cells.
///
/// Cells stay as `serde_json::Value` so identifier-like columns keep their
/// exact textual form through a store round-trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Position of a column by exact header name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Cells of one column, or `None` if the column is absent.
    ///
    /// Short rows yield `Value::Null` for the missing cell.
    pub fn column<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(idx).unwrap_or(&NULL)),
        )
    }

    /// Keep only rows matching `keep`.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
