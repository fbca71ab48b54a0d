//! Column type inference shared by the comparator and the validators.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

use super::types::ColumnType;

/// Date-only formats accepted by `looks_like_date`.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Date-time formats accepted by `looks_like_date`.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a value as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a value parses as a date or timestamp in one of the common layouts.
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }

    DateTime::parse_from_rfc3339(trimmed).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
}

/// Infer a column's type from its first non-empty value.
///
/// Columns with no non-empty values are strings.
pub fn infer_column_type(dataset: &Dataset, column: &str) -> ColumnType {
    dataset
        .non_empty_cells(column)
        .next()
        .map(|(_, value)| ColumnType::of_value(&value))
        .unwrap_or_default()
}

/// A value that failed to parse as its column's proposed type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub row: usize,
    pub value: String,
}

/// Proposed type of a column plus the sampled values that contradict it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeProfile {
    pub column: String,
    pub inferred_type: ColumnType,
    /// Non-empty values inspected.
    pub sampled: usize,
    pub mismatches: Vec<TypeMismatch>,
}

impl TypeProfile {
    /// Whether every sampled value parses as the inferred type.
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Infer a column's type and re-scan the first `sample_size` rows for values
/// that do not parse as that type. Empty cells are skipped.
pub fn profile_column(dataset: &Dataset, column: &str, sample_size: usize) -> TypeProfile {
    let inferred_type = infer_column_type(dataset, column);
    let mut sampled = 0;
    let mut mismatches = Vec::new();

    for (row, value) in dataset
        .non_empty_cells(column)
        .take_while(|(row, _)| *row < sample_size)
    {
        sampled += 1;
        if !inferred_type.accepts(&value) {
            mismatches.push(TypeMismatch {
                row,
                value: value.into_owned(),
            });
        }
    }

    TypeProfile {
        column: column.to_string(),
        inferred_type,
        sampled,
        mismatches,
    }
}
