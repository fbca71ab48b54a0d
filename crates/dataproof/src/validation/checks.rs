//! Completeness, type, duplicate and anomaly checks.

use std::collections::{BTreeSet, HashSet};

use crate::config::{EngineConfig, StatisticsConfig, TextConfig};
use crate::dataset::{cell_text, is_empty_cell, Dataset};
use crate::schema::profile_column;

use super::result::{CheckCategory, CheckStatus, ValidationResult};
use super::statistics::{numeric_column, NumericSummary};
use super::text::{detect_format, text_column};

/// A single validation rule.
pub trait Validator {
    /// Run the check and return its results.
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult>;
}

/// Quote up to `limit` values for a details message: `"a", "b"`.
pub(crate) fn quote_examples<S: AsRef<str>>(values: &[S], limit: usize) -> String {
    values
        .iter()
        .take(limit)
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Passes when the dataset has at least one row.
pub struct RowCountValidator;

impl Validator for RowCountValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let rows = dataset.row_count();
        let result = if rows > 0 {
            ValidationResult::new(
                "Row Count",
                CheckStatus::Pass,
                format!("Dataset contains {} rows", rows),
            )
        } else {
            ValidationResult::new("Row Count", CheckStatus::Fail, "Dataset contains no rows")
        };

        vec![result.with_category(CheckCategory::Completeness)]
    }
}

/// Counts empty cells across the whole table.
///
/// Pass with no missing cells, Warning below `fail_ratio` of all cells, Fail
/// at or above it.
pub struct MissingValuesValidator {
    fail_ratio: f64,
}

impl MissingValuesValidator {
    pub fn new(fail_ratio: f64) -> Self {
        Self { fail_ratio }
    }

    /// Missing cell count per header, in header order.
    fn count_missing<'a>(&self, dataset: &'a Dataset) -> Vec<(&'a str, usize)> {
        dataset
            .headers
            .iter()
            .map(|header| {
                let missing = dataset
                    .column_values(header)
                    .filter(|v| is_empty_cell(*v))
                    .count();
                (header.as_str(), missing)
            })
            .collect()
    }
}

impl Default for MissingValuesValidator {
    fn default() -> Self {
        Self::new(EngineConfig::default().missing_fail_ratio)
    }
}

impl Validator for MissingValuesValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let per_column = self.count_missing(dataset);
        let total_missing: usize = per_column.iter().map(|(_, n)| n).sum();
        let total_cells = dataset.row_count() * dataset.column_count();

        if total_missing == 0 {
            return vec![
                ValidationResult::new(
                    "Missing Values",
                    CheckStatus::Pass,
                    "No missing values found",
                )
                .with_category(CheckCategory::Completeness),
            ];
        }

        let ratio = total_missing as f64 / total_cells as f64;
        let status = if ratio < self.fail_ratio {
            CheckStatus::Warning
        } else {
            CheckStatus::Fail
        };

        let affected: Vec<(&str, usize)> = per_column.into_iter().filter(|(_, n)| *n > 0).collect();
        let breakdown = affected
            .iter()
            .map(|(name, n)| format!("{} ({})", name, n))
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            ValidationResult::new(
                "Missing Values",
                status,
                format!(
                    "Found {} missing values ({:.2}% of cells) in {} column(s): {}",
                    total_missing,
                    ratio * 100.0,
                    affected.len(),
                    breakdown
                ),
            )
            .with_category(CheckCategory::Completeness)
            .with_columns(affected.iter().map(|(name, _)| name.to_string()).collect()),
        ]
    }
}

/// Per-column completeness, one result per header.
pub struct ColumnCompletenessValidator {
    fail_ratio: f64,
}

impl ColumnCompletenessValidator {
    pub fn new(fail_ratio: f64) -> Self {
        Self { fail_ratio }
    }
}

impl Validator for ColumnCompletenessValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let rows = dataset.row_count();
        if rows == 0 {
            return vec![
                ValidationResult::new(
                    "Column Completeness",
                    CheckStatus::Info,
                    "Dataset has no rows; completeness not measured",
                )
                .with_category(CheckCategory::Completeness),
            ];
        }

        dataset
            .headers
            .iter()
            .map(|header| {
                let missing_rows: Vec<usize> = dataset
                    .column_values(header)
                    .enumerate()
                    .filter(|(_, v)| is_empty_cell(*v))
                    .map(|(idx, _)| idx)
                    .collect();
                let ratio = missing_rows.len() as f64 / rows as f64;
                let check = format!("Completeness ({})", header);

                let (status, details) = if missing_rows.is_empty() {
                    (CheckStatus::Pass, format!("Column '{}' is complete", header))
                } else {
                    let status = if ratio < self.fail_ratio {
                        CheckStatus::Warning
                    } else {
                        CheckStatus::Fail
                    };
                    (
                        status,
                        format!(
                            "Column '{}' is missing {} of {} values ({:.1}%)",
                            header,
                            missing_rows.len(),
                            rows,
                            ratio * 100.0
                        ),
                    )
                };

                ValidationResult::new(check, status, details)
                    .with_category(CheckCategory::Completeness)
                    .with_column(header.clone())
                    .with_rows(missing_rows)
            })
            .collect()
    }
}

/// Fails when a column's sampled values diverge from its inferred type.
pub struct TypeConsistencyValidator {
    sample_size: usize,
    max_examples: usize,
}

impl TypeConsistencyValidator {
    pub fn new(sample_size: usize, max_examples: usize) -> Self {
        Self {
            sample_size,
            max_examples,
        }
    }
}

impl Default for TypeConsistencyValidator {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self::new(config.type_sample_size, config.max_examples)
    }
}

impl Validator for TypeConsistencyValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let inconsistent: Vec<_> = dataset
            .headers
            .iter()
            .map(|header| profile_column(dataset, header, self.sample_size))
            .filter(|profile| !profile.is_consistent())
            .collect();

        if inconsistent.is_empty() {
            return vec![
                ValidationResult::new(
                    "Type Consistency",
                    CheckStatus::Pass,
                    format!(
                        "All {} columns have consistent value types",
                        dataset.column_count()
                    ),
                )
                .with_category(CheckCategory::Consistency),
            ];
        }

        let descriptions = inconsistent
            .iter()
            .map(|profile| {
                let values: Vec<&str> =
                    profile.mismatches.iter().map(|m| m.value.as_str()).collect();
                format!(
                    "{} (expected {}, found {})",
                    profile.column,
                    profile.inferred_type,
                    quote_examples(&values, self.max_examples)
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        let rows: BTreeSet<usize> = inconsistent
            .iter()
            .flat_map(|p| p.mismatches.iter().map(|m| m.row))
            .collect();

        vec![
            ValidationResult::new(
                "Type Consistency",
                CheckStatus::Fail,
                format!("Inconsistent types in {} column(s): {}", inconsistent.len(), descriptions),
            )
            .with_category(CheckCategory::Consistency)
            .with_columns(inconsistent.iter().map(|p| p.column.clone()).collect())
            .with_rows(rows.into_iter().collect()),
        ]
    }
}

/// Heuristic duplicate detection: rows sharing the values of their first two
/// columns are treated as duplicates. This is not a primary-key check.
pub struct DuplicateRowValidator;

impl DuplicateRowValidator {
    /// Columns the grouping key is built from.
    fn key_columns(dataset: &Dataset) -> &[String] {
        &dataset.headers[..dataset.headers.len().min(2)]
    }

    /// Row indices whose key was already seen earlier.
    fn find_duplicates(dataset: &Dataset) -> Vec<usize> {
        let key_columns = Self::key_columns(dataset);
        let mut seen = HashSet::new();

        dataset
            .rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let key: Vec<String> = key_columns
                    .iter()
                    .map(|c| cell_text(row.get(c)).into_owned())
                    .collect();
                if seen.insert(key) { None } else { Some(idx) }
            })
            .collect()
    }
}

impl Validator for DuplicateRowValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let duplicates = Self::find_duplicates(dataset);
        let key_columns = Self::key_columns(dataset).to_vec();
        let key_label = key_columns
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(" and ");

        let result = if duplicates.is_empty() {
            ValidationResult::new(
                "Duplicate Detection",
                CheckStatus::Pass,
                format!("No duplicate rows found (matching on {})", key_label),
            )
        } else {
            ValidationResult::new(
                "Duplicate Detection",
                CheckStatus::Warning,
                format!(
                    "Found {} duplicate rows among {} (matching on {})",
                    duplicates.len(),
                    dataset.row_count(),
                    key_label
                ),
            )
            .with_rows(duplicates)
        };

        vec![
            result
                .with_category(CheckCategory::Uniqueness)
                .with_columns(key_columns),
        ]
    }
}

/// Lightweight anomaly pass: IQR outliers in numeric columns and format
/// breaks in text columns, summarized as one result.
pub struct AnomalyValidator {
    statistics: StatisticsConfig,
    text: TextConfig,
}

impl AnomalyValidator {
    pub fn new(statistics: StatisticsConfig, text: TextConfig) -> Self {
        Self { statistics, text }
    }
}

impl Default for AnomalyValidator {
    fn default() -> Self {
        Self::new(StatisticsConfig::default(), TextConfig::default())
    }
}

impl Validator for AnomalyValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let mut notes = Vec::new();
        let mut columns = Vec::new();
        let mut rows = BTreeSet::new();

        let stats = &self.statistics;
        for header in &dataset.headers {
            if let Some(values) = numeric_column(dataset, header, stats.numeric_column_ratio) {
                let plain: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
                let Some(summary) = NumericSummary::from_values(&plain, stats.iqr_multiplier) else {
                    continue;
                };
                let outliers = summary.outlier_rows(&values);
                if !outliers.is_empty() {
                    notes.push(format!("{}: {} outlier(s)", header, outliers.len()));
                    columns.push(header.clone());
                    rows.extend(outliers);
                }
            } else if let Some(cells) = text_column(dataset, header, self.text.max_numeric_ratio) {
                let Some(profile) = detect_format(&cells) else {
                    continue;
                };
                if profile.rate >= self.text.format_detect_ratio
                    && profile.rate < self.text.format_consistent_ratio
                {
                    notes.push(format!(
                        "{}: {} value(s) break the {} format",
                        header,
                        profile.mismatched_rows.len(),
                        profile.format.label()
                    ));
                    columns.push(header.clone());
                    rows.extend(profile.mismatched_rows);
                }
            }
        }

        let result = if notes.is_empty() {
            ValidationResult::new("Anomaly Detection", CheckStatus::Pass, "No anomalies detected")
        } else {
            ValidationResult::new(
                "Anomaly Detection",
                CheckStatus::Warning,
                format!("Potential anomalies: {}", notes.join("; ")),
            )
            .with_columns(columns)
            .with_rows(rows.into_iter().collect())
        };

        vec![result.with_category(CheckCategory::Statistical)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::from_string_rows(
            "test",
            "test",
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_row_count() {
        let ds = make_dataset(vec!["id"], vec![vec!["1"]]);
        assert_eq!(RowCountValidator.validate(&ds)[0].status, CheckStatus::Pass);

        let empty = make_dataset(vec!["id"], vec![]);
        assert_eq!(RowCountValidator.validate(&empty)[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_missing_values_thresholds() {
        // 1 of 20 cells missing: exactly 5%
        let mut rows: Vec<Vec<&str>> = (0..10).map(|_| vec!["x", "y"]).collect();
        rows[3] = vec!["x", ""];
        let ds = make_dataset(vec!["a", "b"], rows.clone());
        let results = MissingValuesValidator::new(0.05).validate(&ds);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[0].affected_columns, vec!["b"]);

        // same data, looser threshold
        let results = MissingValuesValidator::new(0.06).validate(&ds);
        assert_eq!(results[0].status, CheckStatus::Warning);

        rows[3] = vec!["x", "y"];
        let ds = make_dataset(vec!["a", "b"], rows);
        let results = MissingValuesValidator::default().validate(&ds);
        assert_eq!(results[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_column_completeness() {
        let ds = make_dataset(
            vec!["id", "email"],
            vec![vec!["1", "a@x.com"], vec!["2", ""], vec!["3", "c@x.com"]],
        );
        let results = ColumnCompletenessValidator::new(0.05).validate(&ds);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[1].status, CheckStatus::Fail);
        assert_eq!(results[1].affected_rows, vec![1]);
    }

    #[test]
    fn test_type_consistency_flags_column() {
        let ds = make_dataset(
            vec!["id", "age"],
            vec![vec!["1", "25"], vec!["2", "N/A"], vec!["3", "40"]],
        );
        let results = TypeConsistencyValidator::default().validate(&ds);

        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[0].affected_columns, vec!["age"]);
        assert!(results[0].details.contains("\"N/A\""));
        assert_eq!(results[0].affected_rows, vec![1]);
    }

    #[test]
    fn test_duplicates_use_first_two_columns() {
        let ds = make_dataset(
            vec!["first", "last", "age"],
            vec![
                vec!["Ann", "Lee", "30"],
                vec!["Bob", "Ray", "41"],
                vec!["Ann", "Lee", "31"],
            ],
        );
        let results = DuplicateRowValidator.validate(&ds);

        assert_eq!(results[0].status, CheckStatus::Warning);
        assert_eq!(results[0].affected_rows, vec![2]);
        assert_eq!(results[0].affected_columns, vec!["first", "last"]);
    }

    #[test]
    fn test_no_duplicates() {
        let ds = make_dataset(vec!["id"], vec![vec!["1"], vec!["2"]]);
        assert_eq!(DuplicateRowValidator.validate(&ds)[0].status, CheckStatus::Pass);
    }

    #[test]
    fn test_anomaly_finds_outlier() {
        let mut rows: Vec<Vec<String>> = (0..20).map(|i| vec![format!("{}", 10 + i % 3)]).collect();
        rows.push(vec!["500".to_string()]);
        let ds = Dataset::from_string_rows("t", "t", vec!["value".to_string()], rows);

        let results = AnomalyValidator::default().validate(&ds);
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert_eq!(results[0].affected_rows, vec![20]);
    }

    #[test]
    fn test_quote_examples() {
        assert_eq!(quote_examples(&["a", "b", "c", "d"], 3), "\"a\", \"b\", \"c\"");
        assert_eq!(quote_examples::<&str>(&[], 3), "");
    }
}
