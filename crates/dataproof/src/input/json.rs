//! JSON datasets: an array of records, or an object with `headers` and
//! `rows` (alias `content`).

use serde_json::{Map, Value};

use crate::dataset::Row;
use crate::error::{DataproofError, Result};

use super::delimited::unique_headers;

/// Headers and records read from JSON, plus optional id/name fields.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonTable {
    pub id: Option<String>,
    pub name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse a JSON document into headers and records.
///
/// Records may be objects or positional arrays (the latter require
/// `headers`). Without `headers`, columns are collected from the records'
/// keys in first-seen order.
pub fn parse_json(bytes: &[u8]) -> Result<JsonTable> {
    let document: Value = serde_json::from_slice(bytes)?;

    let (id, name, declared, records) = match document {
        Value::Array(records) => (None, None, None, records),
        Value::Object(mut object) => {
            let records = match object.remove("rows").or_else(|| object.remove("content")) {
                Some(Value::Array(records)) => records,
                Some(_) => {
                    return Err(DataproofError::UnsupportedFormat(
                        "'rows' must be an array".to_string(),
                    ));
                }
                None => Vec::new(),
            };
            let declared = match object.remove("headers") {
                Some(Value::Array(headers)) => Some(
                    headers
                        .into_iter()
                        .map(|h| match h {
                            Value::String(s) => s.trim().to_string(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            };
            (
                string_field(&object, "id"),
                string_field(&object, "name"),
                declared,
                records,
            )
        }
        _ => {
            return Err(DataproofError::UnsupportedFormat(
                "expected a JSON array of records or an object with 'rows'".to_string(),
            ));
        }
    };

    let headers = match declared {
        Some(headers) => unique_headers(headers),
        None => collect_keys(&records),
    };

    if headers.is_empty() {
        return Err(DataproofError::EmptyData("No columns found".to_string()));
    }

    let rows = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| to_row(record, &headers, idx))
        .collect::<Result<Vec<Row>>>()?;

    Ok(JsonTable { id, name, headers, rows })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn collect_keys(records: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(object) = record {
            for key in object.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

/// Convert one record, keeping only declared columns.
fn to_row(record: Value, headers: &[String], idx: usize) -> Result<Row> {
    match record {
        Value::Object(mut object) => Ok(headers
            .iter()
            .filter_map(|h| object.remove(h).map(|v| (h.clone(), v)))
            .collect()),
        Value::Array(values) => Ok(headers.iter().cloned().zip(values).collect()),
        other => Err(DataproofError::UnsupportedFormat(format!(
            "record {} is a {}, expected an object or array",
            idx,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
