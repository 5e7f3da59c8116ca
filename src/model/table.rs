// src/model/table.rs
//! Tabular results: an ordered column list with row-major cells.
//!
//! The layout mirrors the row/column-oriented ("split") serialization the
//! search service returns, so a decoded payload and the table built from it
//! are the same value.

use super::ResultRecord;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "SplitParts")]
pub struct ResultTable {
    columns: Vec<String>,
    index: Vec<Value>,
    data: Vec<Vec<Value>>,
}

/// Unchecked wire form; deserialization goes through [`ResultTable::from_parts`].
#[derive(Deserialize)]
struct SplitParts {
    columns: Vec<String>,
    #[serde(default)]
    index: Option<Vec<Value>>,
    data: Vec<Vec<Value>>,
}

impl TryFrom<SplitParts> for ResultTable {
    type Error = TableShapeError;

    fn try_from(parts: SplitParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts.columns, parts.index, parts.data)
    }
}

/// Why a set of parts does not form a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableShapeError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("index has {index} labels for {rows} rows")]
    IndexLength { index: usize, rows: usize },
    #[error("duplicate column {0}")]
    DuplicateColumn(String),
}

impl ResultTable {
    /// Builds a table from split parts. A missing index becomes `0..rows`.
    pub fn from_parts(
        columns: Vec<String>,
        index: Option<Vec<Value>>,
        data: Vec<Vec<Value>>,
    ) -> Result<Self, TableShapeError> {
        let mut seen = IndexSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableShapeError::DuplicateColumn(column.clone()));
            }
        }

        for (row, cells) in data.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableShapeError::RowWidth {
                    row,
                    found: cells.len(),
                    expected: columns.len(),
                });
            }
        }

        let index = match index {
            Some(index) if index.len() != data.len() => {
                return Err(TableShapeError::IndexLength {
                    index: index.len(),
                    rows: data.len(),
                })
            }
            Some(index) => index,
            None => contiguous_index(data.len()),
        };

        Ok(Self {
            columns,
            index,
            data,
        })
    }

    /// Builds a table from records whose fields may differ.
    ///
    /// Columns named in `leading` come first (when any record has them),
    /// followed by every other field in first-seen order across the records.
    /// Fields a record lacks are filled with `null`. Rows are indexed `0..n`.
    pub fn from_records(records: Vec<ResultRecord>, leading: &[&str]) -> Self {
        let mut columns: IndexSet<String> = leading
            .iter()
            .filter(|name| records.iter().any(|r| r.contains(name)))
            .map(|name| name.to_string())
            .collect();
        for record in &records {
            for name in record.field_names() {
                if !columns.contains(name) {
                    columns.insert(name.to_string());
                }
            }
        }

        let data = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|name| record.take(name).unwrap_or(Value::Null))
                    .collect()
            })
            .collect::<Vec<Vec<Value>>>();

        Self {
            columns: columns.into_iter().collect(),
            index: contiguous_index(data.len()),
            data,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.column_position(column)?;
        self.data.get(row)?.get(position)
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let position = self.column_position(column)?;
        Some(self.data.iter().filter_map(|cells| cells.get(position)).collect())
    }

    /// Raw rows in column order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.data.iter().map(Vec::as_slice)
    }

    /// One row as a record keyed by column name.
    pub fn record(&self, row: usize) -> Option<ResultRecord> {
        let cells = self.data.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(cells.iter().cloned())
                .collect(),
        )
    }
}

fn contiguous_index(rows: usize) -> Vec<Value> {
    (0..rows).map(|i| Value::from(i as u64)).collect()
}
