//! Key-based row alignment and cell-by-cell diffing.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dataset::{cell_text, Dataset, Row};
use crate::error::{DataproofError, Result};
use crate::schema::infer_column_type;

use super::result::{
    CellDifference, ColumnComparison, ComparisonResult, ComparisonSummary, MissingRow, RowLocation,
};

/// Compares two datasets by aligning their rows on a key column.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    /// Explicit key column. When unset, or when a dataset lacks it, each
    /// dataset uses `id` or its first header.
    key_column: Option<String>,
}

impl Comparator {
    /// Create a comparator that infers key columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Align rows on a caller-chosen column.
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Compare `source` against `target`.
    ///
    /// Fails with `EmptyContent` when either dataset has no rows or no
    /// headers. Rows without a counterpart are reported in `missing`, never
    /// as errors.
    pub fn compare(&self, source: &Dataset, target: &Dataset) -> Result<ComparisonResult> {
        let started = Instant::now();

        let source_key = self.resolve_key(source)?;
        let target_key = self.resolve_key(target)?;

        let common_headers: Vec<&str> = source
            .headers
            .iter()
            .filter(|h| target.has_column(h))
            .map(String::as_str)
            .collect();

        if common_headers.is_empty() {
            warn!(
                source = %source.id,
                target = %target.id,
                "datasets share no columns; only row presence is compared"
            );
        }

        let source_index = index_rows(source, source_key);
        let target_index = index_rows(target, target_key);

        let mut column_differences: IndexMap<&str, usize> =
            common_headers.iter().map(|h| (*h, 0)).collect();
        let mut differences = Vec::new();
        let mut missing = Vec::new();

        for target_row in &target.rows {
            let key = row_key(target_row, target_key);
            match source_index.get(key.as_str()) {
                Some(source_row) => {
                    for &column in &common_headers {
                        let source_value = source_row.get(column);
                        let target_value = target_row.get(column);
                        if cell_text(source_value) != cell_text(target_value) {
                            differences.push(CellDifference {
                                key: key.clone(),
                                column: column.to_string(),
                                source_value: source_value.cloned().unwrap_or(Value::Null),
                                target_value: target_value.cloned().unwrap_or(Value::Null),
                            });
                            if let Some(count) = column_differences.get_mut(column) {
                                *count += 1;
                            }
                        }
                    }
                }
                None => missing.push(MissingRow {
                    key,
                    location: RowLocation::Source,
                    columns: target_row.clone(),
                }),
            }
        }

        for source_row in &source.rows {
            let key = row_key(source_row, source_key);
            if !target_index.contains_key(key.as_str()) {
                missing.push(MissingRow {
                    key,
                    location: RowLocation::Target,
                    columns: source_row.clone(),
                });
            }
        }

        let columns = build_column_results(source, target, &column_differences);

        let rows_analyzed = source.row_count() + target.row_count();
        let rows_missing_source = missing
            .iter()
            .filter(|m| m.location == RowLocation::Source)
            .count();
        let rows_missing_target = missing.len() - rows_missing_source;
        let rows_different = differences
            .iter()
            .map(|d| d.key.as_str())
            .collect::<HashSet<_>>()
            .len();
        let rows_matched = rows_analyzed as i64 - missing.len() as i64 - differences.len() as i64;
        let columns_different = columns.iter().filter(|c| !c.matches).count();

        let summary = ComparisonSummary {
            rows_analyzed,
            rows_matched,
            rows_different,
            rows_missing_source,
            rows_missing_target,
            columns_compared: common_headers.len(),
            columns_different,
            execution_time: format!("{:.2}s", started.elapsed().as_secs_f64()),
        };

        debug!(
            source = %source.id,
            target = %target.id,
            differences = differences.len(),
            missing = missing.len(),
            "comparison finished"
        );

        Ok(ComparisonResult {
            summary,
            columns,
            differences,
            missing,
        })
    }

    /// Key column for one dataset.
    fn resolve_key<'a>(&self, dataset: &'a Dataset) -> Result<&'a str> {
        if dataset.rows.is_empty() {
            return Err(DataproofError::EmptyContent {
                dataset_id: dataset.id.clone(),
            });
        }

        let explicit = self
            .key_column
            .as_deref()
            .and_then(|key| dataset.headers.iter().find(|h| *h == key))
            .map(String::as_str);

        explicit
            .or_else(|| dataset.key_column())
            .ok_or_else(|| DataproofError::EmptyContent {
                dataset_id: dataset.id.clone(),
            })
    }
}

/// Compare two datasets with inferred key columns.
pub fn compare(source: &Dataset, target: &Dataset) -> Result<ComparisonResult> {
    Comparator::new().compare(source, target)
}

fn row_key(row: &Row, key_column: &str) -> String {
    cell_text(row.get(key_column)).into_owned()
}

/// Key to row map. A key repeated within one dataset keeps its last row.
fn index_rows<'a>(dataset: &'a Dataset, key_column: &str) -> HashMap<String, &'a Row> {
    dataset
        .rows
        .iter()
        .map(|row| (row_key(row, key_column), row))
        .collect()
}

fn build_column_results(
    source: &Dataset,
    target: &Dataset,
    column_differences: &IndexMap<&str, usize>,
) -> Vec<ColumnComparison> {
    let mut columns: Vec<ColumnComparison> = column_differences
        .iter()
        .map(|(name, count)| ColumnComparison {
            name: name.to_string(),
            column_type: infer_column_type(source, name),
            matches: *count == 0,
            differences: *count,
        })
        .collect();

    for name in source.headers.iter().filter(|h| !target.has_column(h)) {
        columns.push(ColumnComparison {
            name: name.clone(),
            column_type: infer_column_type(source, name),
            matches: false,
            differences: source.row_count(),
        });
    }

    for name in target.headers.iter().filter(|h| !source.has_column(h)) {
        columns.push(ColumnComparison {
            name: name.clone(),
            column_type: infer_column_type(target, name),
            matches: false,
            differences: target.row_count(),
        });
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use serde_json::json;

    fn make_dataset(id: &str, headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::from_string_rows(
            id,
            id,
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_single_cell_difference() {
        let source = make_dataset("a", vec!["id", "email"], vec![vec!["1", "a@x.com"]]);
        let target = make_dataset("b", vec!["id", "email"], vec![vec!["1", "b@x.com"]]);

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.differences[0].key, "1");
        assert_eq!(result.differences[0].column, "email");
        assert_eq!(result.differences[0].source_value, json!("a@x.com"));
        assert_eq!(result.summary.rows_different, 1);
        assert!(result.missing.is_empty());
        assert!(!result.column("email").unwrap().matches);
        assert!(result.column("id").unwrap().matches);
    }

    #[test]
    fn test_missing_from_source() {
        let source = make_dataset("a", vec!["id"], vec![vec!["1"]]);
        let target = make_dataset("b", vec!["id"], vec![vec!["1"], vec!["2"]]);

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].key, "2");
        assert_eq!(result.missing[0].location, RowLocation::Source);
        assert_eq!(result.missing[0].columns.get("id"), Some(&json!("2")));
        assert_eq!(result.summary.rows_missing_source, 1);
        assert_eq!(result.summary.rows_missing_target, 0);
    }

    #[test]
    fn test_missing_from_target() {
        let source = make_dataset("a", vec!["id"], vec![vec!["1"], vec!["3"]]);
        let target = make_dataset("b", vec!["id"], vec![vec!["1"]]);

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.summary.rows_missing_target, 1);
        assert_eq!(result.missing_in(RowLocation::Target).count(), 1);
    }

    #[test]
    fn test_rows_different_counts_keys_not_cells() {
        let source = make_dataset("a", vec!["id", "x", "y"], vec![vec!["1", "a", "b"]]);
        let target = make_dataset("b", vec!["id", "x", "y"], vec![vec!["1", "c", "d"]]);

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.differences.len(), 2);
        assert_eq!(result.summary.rows_different, 1);
        // 2 rows analyzed - 0 missing - 2 cell differences
        assert_eq!(result.summary.rows_matched, 0);
    }

    #[test]
    fn test_one_sided_columns() {
        let source = make_dataset("a", vec!["id", "age", "old"], vec![vec!["1", "30", "x"]]);
        let target = make_dataset(
            "b",
            vec!["id", "age", "new"],
            vec![vec!["1", "30", "y"], vec!["2", "31", "z"]],
        );

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.columns.len(), 4);
        assert_eq!(result.summary.columns_compared, 2);
        assert_eq!(result.summary.columns_different, 2);

        let old = result.column("old").unwrap();
        assert!(!old.matches);
        assert_eq!(old.differences, 1);

        let new = result.column("new").unwrap();
        assert_eq!(new.differences, 2);

        assert_eq!(result.column("age").unwrap().column_type, ColumnType::Number);
    }

    #[test]
    fn test_key_falls_back_to_first_header() {
        let source = make_dataset("a", vec!["code", "v"], vec![vec!["A", "1"], vec!["B", "2"]]);
        let target = make_dataset("b", vec!["code", "v"], vec![vec!["B", "2"], vec!["A", "9"]]);

        let result = compare(&source, &target).unwrap();

        assert!(result.missing.is_empty());
        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.differences[0].key, "A");
    }

    #[test]
    fn test_explicit_key_column() {
        let source = make_dataset("a", vec!["id", "email"], vec![vec!["1", "a@x.com"]]);
        let target = make_dataset("b", vec!["id", "email"], vec![vec!["7", "a@x.com"]]);

        let result = Comparator::new()
            .with_key_column("email")
            .compare(&source, &target)
            .unwrap();

        assert!(result.missing.is_empty());
        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.differences[0].column, "id");
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let source = make_dataset("a", vec!["id"], vec![]);
        let target = make_dataset("b", vec!["id"], vec![vec!["1"]]);

        let err = compare(&source, &target).unwrap_err();
        assert!(
            matches!(err, DataproofError::EmptyContent { ref dataset_id } if dataset_id == "a")
        );
    }

    #[test]
    fn test_whole_floats_equal_integers() {
        let row = |id: Value, age: Value| -> Row {
            [("id".to_string(), id), ("age".to_string(), age)].into_iter().collect()
        };
        let headers = vec!["id".to_string(), "age".to_string()];
        let source = Dataset::new("a", "a", headers.clone(), vec![row(json!(1), json!(30))]);
        let target = Dataset::new(
            "b",
            "b",
            headers,
            vec![row(json!(1.0), json!(30.0)), row(json!(2), json!(30.5))],
        );

        let result = compare(&source, &target).unwrap();

        assert!(result.differences.is_empty());
        assert_eq!(result.missing.len(), 1);
        assert_eq!(result.missing[0].key, "2");
        assert_eq!(result.missing[0].location, RowLocation::Source);
    }

    #[test]
    fn test_no_common_columns() {
        let source = make_dataset("a", vec!["id"], vec![vec!["1"]]);
        let target = make_dataset("b", vec!["key"], vec![vec!["1"]]);

        let result = compare(&source, &target).unwrap();

        assert_eq!(result.summary.columns_compared, 0);
        assert_eq!(result.columns.len(), 2);
        assert!(result.differences.is_empty());
    }

    #[test]
    fn test_execution_time_format() {
        let source = make_dataset("a", vec!["id"], vec![vec!["1"]]);
        let result = compare(&source, &source).unwrap();

        assert!(result.summary.execution_time.ends_with('s'));
        assert!(result.summary.execution_time.contains('.'));
        assert!(result.is_identical());
    }

    #[test]
    fn test_serializes_camel_case() {
        let source = make_dataset("a", vec!["id"], vec![vec!["1"]]);
        let target = make_dataset("b", vec!["id"], vec![vec!["2"]]);
        let result = compare(&source, &target).unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["rowsMissingSource"], 1);
        assert_eq!(json["missing"][0]["location"], "source");
        assert_eq!(json["columns"][0]["type"], "number");

        let back: ComparisonResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
