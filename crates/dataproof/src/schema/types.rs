//! Core type definitions for column classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::inference::{looks_like_date, parse_number};

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Values parse as finite numbers.
    Number,
    /// Values parse as calendar dates or timestamps.
    Date,
    /// Anything else.
    #[default]
    String,
}

impl ColumnType {
    /// Classify a single non-empty value.
    pub fn of_value(value: &str) -> Self {
        if parse_number(value).is_some() {
            ColumnType::Number
        } else if looks_like_date(value) {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }

    /// Whether a non-empty value is compatible with this type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ColumnType::Number => parse_number(value).is_some(),
            ColumnType::Date => looks_like_date(value),
            ColumnType::String => true,
        }
    }

    /// Lowercase name as used in results.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
