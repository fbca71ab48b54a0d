//! Comparison result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::Row;
use crate::schema::ColumnType;

/// Aggregate counts for a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    /// Source rows plus target rows.
    pub rows_analyzed: usize,
    /// `rows_analyzed - missing - differences`; an approximation that can go
    /// negative when rows carry several differing cells.
    pub rows_matched: i64,
    /// Distinct keys with at least one differing cell.
    pub rows_different: usize,
    /// Rows present in the target but absent from the source.
    pub rows_missing_source: usize,
    /// Rows present in the source but absent from the target.
    pub rows_missing_target: usize,
    /// Headers present in both datasets.
    pub columns_compared: usize,
    /// Column results with `matches == false`.
    pub columns_different: usize,
    /// Wall-clock duration, e.g. `"0.02s"`.
    pub execution_time: String,
}

/// Per-column comparison outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnComparison {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub matches: bool,
    pub differences: usize,
}

/// One mismatching cell between rows sharing a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDifference {
    pub key: String,
    pub column: String,
    pub source_value: Value,
    pub target_value: Value,
}

/// Which side lacks a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowLocation {
    /// Present in the target, absent from the source.
    Source,
    /// Present in the source, absent from the target.
    Target,
}

/// A row whose key has no counterpart on the other side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRow {
    pub key: String,
    pub location: RowLocation,
    /// Full payload of the row that has no counterpart.
    pub columns: Row,
}

/// Structured diff of two datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub summary: ComparisonSummary,
    pub columns: Vec<ColumnComparison>,
    pub differences: Vec<CellDifference>,
    pub missing: Vec<MissingRow>,
}

impl ComparisonResult {
    /// Missing rows on one side.
    pub fn missing_in(&self, location: RowLocation) -> impl Iterator<Item = &MissingRow> {
        self.missing.iter().filter(move |m| m.location == location)
    }

    /// Column outcome by name.
    pub fn column(&self, name: &str) -> Option<&ColumnComparison> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether no difference, missing row, or one-sided column was found.
    pub fn is_identical(&self) -> bool {
        self.differences.is_empty()
            && self.missing.is_empty()
            && self.summary.columns_different == 0
    }
}
