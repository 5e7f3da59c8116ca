// src/model/mod.rs
//! Result data handed back to callers: records, tables and operation reports.

mod table;

pub use table::{ResultTable, TableShapeError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// One result row as a mapping of field name to value, in field order.
///
/// The field set varies between source records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(IndexMap<String, Value>);

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Removes a field, preserving the order of the others.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        self.0.shift_remove(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ResultRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for ResultRecord {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A step that failed inside an operation which still produced its table.
///
/// Partial failures are reported, never raised: the caller gets the table
/// and a list of what was left out.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFailure {
    pub stage: &'static str,
    pub message: String,
}

impl fmt::Display for PartialFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// A FASTA file written by the bulk download.
#[derive(Debug, Clone, PartialEq)]
pub struct FastaDownload {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub chunks_written: usize,
}

/// Outcome of an operation that yields a table and may also deliver FASTA.
#[derive(Debug, Clone, Default)]
pub struct TableReport {
    pub table: ResultTable,
    pub fasta: Option<FastaDownload>,
    pub partial_failures: Vec<PartialFailure>,
}

impl TableReport {
    pub fn new(table: ResultTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// Whether every requested artifact was produced.
    pub fn is_complete(&self) -> bool {
        self.partial_failures.is_empty()
    }
}
