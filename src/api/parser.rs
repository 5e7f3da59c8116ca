// src/api/parser.rs
//! Pure decoding of PLSDB response bodies.
//!
//! No I/O happens here; every function takes an already received body and
//! returns one of the tagged unions from `responses`.

use super::responses::{JobReply, LookupResponse, LookupSchema, RawJobReply, ServerLabel};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::ProtocolError;
use crate::model::{ResultRecord, ResultTable};
use crate::types::JobId;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

const CURRENT_RECORD_KEY: &str = "Metadata_annotations";
const CURRENT_AMBIGUITY_KEY: &str = "searched";
const LEGACY_RECORD_KEY: &str = "NUCCORE_ACC";
const LEGACY_AMBIGUITY_KEY: &str = "multiple_matches";

/// Parses a response body as JSON.
pub fn parse_json(body: &str) -> Result<Value, ProtocolError> {
    serde_json::from_str(body).map_err(|e| {
        ProtocolError::Malformed(format!("{} in body {:?}", e, preview(body)))
    })
}

/// Decodes a submit or status answer of the job endpoints.
pub fn decode_job_reply(value: Value) -> Result<JobReply, ProtocolError> {
    if !value.is_object() {
        return Err(ProtocolError::UnexpectedShape(format!(
            "expected a JSON object, got {}",
            preview(&value.to_string())
        )));
    }

    let raw: RawJobReply =
        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let job_id = match raw.job_id {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if id.trim().is_empty() => None,
        Some(Value::String(id)) => Some(JobId::new(id)),
        Some(Value::Number(id)) => Some(JobId::new(id.to_string())),
        Some(other) => {
            return Err(ProtocolError::UnexpectedShape(format!(
                "job_id is neither string nor number: {}",
                other
            )))
        }
    };

    Ok(JobReply {
        label: raw.label.as_deref().map(ServerLabel::parse),
        job_id,
        error: raw.error,
        results: raw.results,
        notfound: raw.notfound,
    })
}

#[derive(Deserialize)]
struct SplitTable {
    columns: Vec<String>,
    #[serde(default)]
    index: Option<Vec<Value>>,
    data: Vec<Vec<Value>>,
}

/// Decodes a row/column-oriented ("split") serialized table.
///
/// The payload may arrive as a JSON object or as a string holding one.
pub fn decode_split_table(payload: Value) -> Result<ResultTable, ProtocolError> {
    let payload = match payload {
        Value::String(text) => parse_json(&text)?,
        other => other,
    };
    let split: SplitTable = serde_json::from_value(payload)
        .map_err(|e| ProtocolError::Malformed(format!("results table: {}", e)))?;
    ResultTable::from_parts(split.columns, split.index, split.data)
        .map_err(|e| ProtocolError::Malformed(format!("results table: {}", e)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnCells {
    List(Vec<Value>),
    Keyed(IndexMap<String, Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterPayload {
    Split(SplitTable),
    Records(Vec<Map<String, Value>>),
    Columns(IndexMap<String, ColumnCells>),
}

/// Decodes a filter answer into a table.
///
/// Filter endpoints answer with a split table, a list of records, or a
/// column-oriented object (`{column: [..]}` or `{column: {row: value}}`).
pub fn decode_filter_table(payload: Value) -> Result<ResultTable, ProtocolError> {
    let payload: FilterPayload = serde_json::from_value(payload)
        .map_err(|e| ProtocolError::Malformed(format!("filter result: {}", e)))?;

    let shape = |e: crate::model::TableShapeError| {
        ProtocolError::Malformed(format!("filter result: {}", e))
    };

    match payload {
        FilterPayload::Split(split) => {
            ResultTable::from_parts(split.columns, split.index, split.data).map_err(shape)
        }
        FilterPayload::Records(records) => Ok(ResultTable::from_records(
            records.into_iter().map(ResultRecord::from).collect(),
            &[],
        )),
        FilterPayload::Columns(columns) => columns_to_table(columns).map_err(shape),
    }
}

fn columns_to_table(
    columns: IndexMap<String, ColumnCells>,
) -> Result<ResultTable, crate::model::TableShapeError> {
    // Row labels in first-seen order across keyed columns
    let mut row_labels: IndexMap<String, usize> = IndexMap::new();
    let mut rows = 0usize;
    for cells in columns.values() {
        match cells {
            ColumnCells::List(values) => rows = rows.max(values.len()),
            ColumnCells::Keyed(values) => {
                for key in values.keys() {
                    let next = row_labels.len();
                    row_labels.entry(key.clone()).or_insert(next);
                }
            }
        }
    }
    let rows = rows.max(row_labels.len());

    let names: Vec<String> = columns.keys().cloned().collect();
    let mut data = vec![vec![Value::Null; names.len()]; rows];
    for (col, cells) in columns.into_values().enumerate() {
        match cells {
            ColumnCells::List(values) => {
                for (row, value) in values.into_iter().enumerate() {
                    data[row][col] = value;
                }
            }
            ColumnCells::Keyed(values) => {
                for (key, value) in values {
                    if let Some(&row) = row_labels.get(&key) {
                        data[row][col] = value;
                    }
                }
            }
        }
    }

    let index = if row_labels.is_empty() {
        None
    } else {
        let mut labels: Vec<Value> = row_labels.keys().map(|k| label_value(k)).collect();
        // list columns longer than the keyed ones get positional labels
        for row in labels.len()..rows {
            labels.push(Value::from(row as u64));
        }
        Some(labels)
    };

    ResultTable::from_parts(names, index, data)
}

fn label_value(key: &str) -> Value {
    key.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(key.to_string()))
}

/// Decodes an accession lookup answer under both schema generations.
///
/// Multi-match markers take precedence over record markers.
pub fn decode_lookup(value: Value) -> LookupResponse {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return LookupResponse::Unrecognized {
                fields: vec![format!("<{}>", json_kind(&other))],
            }
        }
    };

    if map.contains_key(CURRENT_AMBIGUITY_KEY) {
        let candidates = map
            .iter()
            .filter(|(key, _)| key.as_str() != CURRENT_AMBIGUITY_KEY)
            .flat_map(|(_, value)| string_items(value))
            .collect();
        return LookupResponse::Ambiguous {
            schema: LookupSchema::Current,
            candidates,
            record: ResultRecord::from(map),
        };
    }

    if let Some(matches) = map.get(LEGACY_AMBIGUITY_KEY) {
        let candidates = string_items(matches);
        return LookupResponse::Ambiguous {
            schema: LookupSchema::Legacy,
            candidates,
            record: ResultRecord::from(map),
        };
    }

    if map.contains_key(CURRENT_RECORD_KEY) {
        return LookupResponse::Unique {
            schema: LookupSchema::Current,
            record: ResultRecord::from(map),
        };
    }

    if map.get(LEGACY_RECORD_KEY).is_some_and(Value::is_string) {
        return LookupResponse::Unique {
            schema: LookupSchema::Legacy,
            record: ResultRecord::from(map),
        };
    }

    LookupResponse::Unrecognized {
        fields: map.keys().cloned().collect(),
    }
}

/// Strings held by a value: the value itself or the strings of a list.
fn string_items(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect()
}
