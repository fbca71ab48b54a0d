//! Dataset and row representation.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::metadata::DatasetMetadata;

/// A single record: column name to scalar value, in insertion order.
pub type Row = IndexMap<String, Value>;

/// Column used to align rows when no `id` header exists.
const PREFERRED_KEY_COLUMN: &str = "id";

/// An in-memory table: ordered headers plus ordered row records.
///
/// The engines only ever read a dataset; every result they produce is freshly
/// allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Identifier assigned by the ingesting collaborator.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Column names, unique and ordered.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Row records. Keys are a subset of `headers`.
    #[serde(default)]
    pub rows: Vec<Row>,
    /// Where the dataset came from and when.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DatasetMetadata>,
}

impl Dataset {
    /// Create a dataset from headers and records.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            headers,
            rows,
            metadata: None,
        }
    }

    /// Create a dataset from positional string rows (as produced by CSV readers).
    ///
    /// Cells beyond the header count are dropped; short rows simply omit the
    /// trailing columns.
    pub fn from_string_rows(
        id: impl Into<String>,
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let records = rows
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter().map(Value::String))
                    .collect::<Row>()
            })
            .collect();

        Self::new(id, name, headers, records)
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Whether parsed content (at least one header) is present.
    pub fn has_content(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Whether a header exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Column used to align this dataset's rows against another dataset:
    /// `id` when present, otherwise the first header.
    pub fn key_column(&self) -> Option<&str> {
        if self.has_column(PREFERRED_KEY_COLUMN) {
            Some(PREFERRED_KEY_COLUMN)
        } else {
            self.headers.first().map(String::as_str)
        }
    }

    /// Raw cell values of a column, one per row (`None` when the row lacks the key).
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<&'a Value>> {
        self.rows.iter().map(move |row| row.get(column))
    }

    /// Non-empty cells of a column as text, with their row index.
    pub fn non_empty_cells<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = (usize, Cow<'a, str>)> {
        self.column_values(column)
            .enumerate()
            .filter(|(_, value)| !is_empty_cell(*value))
            .map(|(idx, value)| (idx, cell_text(value)))
    }

    /// Get a specific cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Whether a cell counts as missing: absent, null, or blank text.
pub fn is_empty_cell(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Text rendering of a cell used for comparisons and pattern checks.
///
/// Absent and null cells render as the empty string. Whole floats render
/// without a fraction, so `30` and `30.0` read the same.
pub fn cell_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Number(n)) => Cow::Owned(number_text(n)),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Largest magnitude at which every whole f64 is exactly an integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
