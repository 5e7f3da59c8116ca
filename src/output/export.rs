// src/output/export.rs
//! Tab-separated export of result tables.

use crate::error::AppError;
use crate::model::ResultTable;
use serde_json::Value;
use std::io::Write;

/// Writes `table` as TSV: one header row in column order, then one line per row.
///
/// Strings are written verbatim, `null` as an empty cell, and every other
/// value in compact JSON form. A table without columns writes nothing.
pub fn write_table_tsv<W: Write>(table: &ResultTable, writer: W) -> Result<(), AppError> {
    if table.columns().is_empty() {
        return Ok(());
    }

    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    tsv.write_record(table.columns())
        .map_err(std::io::Error::from)?;
    for row in table.rows() {
        tsv.write_record(row.iter().map(cell_text))
            .map_err(std::io::Error::from)?;
    }
    tsv.flush()?;
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
