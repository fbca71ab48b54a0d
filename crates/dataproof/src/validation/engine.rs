//! Selects and runs the checks of a validation method.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::{DataproofError, Result};

use super::checks::{
    AnomalyValidator, ColumnCompletenessValidator, DuplicateRowValidator, MissingValuesValidator,
    RowCountValidator, TypeConsistencyValidator, Validator,
};
use super::format::{FormatChecksValidator, ValueLookupValidator};
use super::query::CustomQueryValidator;
use super::result::{CheckCategory, CheckStatus, ValidationResult};
use super::statistics::StatisticalValidator;
use super::text::TextPatternValidator;

/// A named bundle of checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    /// Row count and missing values.
    Basic,
    /// Basic plus type consistency, duplicates and the anomaly pass.
    Advanced,
    /// A user-supplied query.
    Custom,
    FormatChecks,
    ValueLookup,
    DataCompleteness,
    DataQuality,
    StatisticalAnalysis,
    TextAnalysis,
}

impl ValidationMethod {
    pub const ALL: [ValidationMethod; 9] = [
        ValidationMethod::Basic,
        ValidationMethod::Advanced,
        ValidationMethod::Custom,
        ValidationMethod::FormatChecks,
        ValidationMethod::ValueLookup,
        ValidationMethod::DataCompleteness,
        ValidationMethod::DataQuality,
        ValidationMethod::StatisticalAnalysis,
        ValidationMethod::TextAnalysis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationMethod::Basic => "basic",
            ValidationMethod::Advanced => "advanced",
            ValidationMethod::Custom => "custom",
            ValidationMethod::FormatChecks => "format_checks",
            ValidationMethod::ValueLookup => "value_lookup",
            ValidationMethod::DataCompleteness => "data_completeness",
            ValidationMethod::DataQuality => "data_quality",
            ValidationMethod::StatisticalAnalysis => "statistical_analysis",
            ValidationMethod::TextAnalysis => "text_analysis",
        }
    }
}

impl FromStr for ValidationMethod {
    type Err = DataproofError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        ValidationMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| DataproofError::UnknownMethod(name.to_string()))
    }
}

impl fmt::Display for ValidationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs validation methods over datasets.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: EngineConfig,
}

impl ValidationEngine {
    /// Create an engine with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Checks making up a method, in execution order.
    pub fn validators_for(
        &self,
        method: ValidationMethod,
        custom_query: Option<&str>,
    ) -> Vec<Box<dyn Validator>> {
        let config = &self.config;
        let basic = || -> Vec<Box<dyn Validator>> {
            vec![
                Box::new(RowCountValidator),
                Box::new(MissingValuesValidator::new(config.missing_fail_ratio)),
            ]
        };
        let quality = || -> Vec<Box<dyn Validator>> {
            vec![
                Box::new(TypeConsistencyValidator::new(
                    config.type_sample_size,
                    config.max_examples,
                )),
                Box::new(DuplicateRowValidator),
            ]
        };

        match method {
            ValidationMethod::Basic => basic(),
            ValidationMethod::Advanced => {
                let mut validators = basic();
                validators.extend(quality());
                validators.push(Box::new(AnomalyValidator::new(
                    config.statistics.clone(),
                    config.text.clone(),
                )));
                validators
            }
            ValidationMethod::Custom => vec![Box::new(CustomQueryValidator::new(custom_query))],
            ValidationMethod::FormatChecks => {
                vec![Box::new(FormatChecksValidator::new(config.max_examples))]
            }
            ValidationMethod::ValueLookup => {
                vec![Box::new(ValueLookupValidator::new(config.max_examples))]
            }
            ValidationMethod::DataCompleteness => {
                vec![Box::new(ColumnCompletenessValidator::new(config.missing_fail_ratio))]
            }
            ValidationMethod::DataQuality => quality(),
            ValidationMethod::StatisticalAnalysis => {
                vec![Box::new(StatisticalValidator::new(config.statistics.clone()))]
            }
            ValidationMethod::TextAnalysis => {
                vec![Box::new(TextPatternValidator::new(config.text.clone(), config.max_examples))]
            }
        }
    }

    /// Validate a dataset with a method given by name.
    ///
    /// Fails only when the dataset has no parsed content. An unknown method
    /// yields a single Warning result; problems found in the data are
    /// reported as results. Every result in the batch shares one timestamp and
    /// carries an id of the form `vr_<millis>_<index>`.
    pub fn validate(
        &self,
        dataset: &Dataset,
        method: &str,
        custom_query: Option<&str>,
    ) -> Result<Vec<ValidationResult>> {
        Self::ensure_content(dataset)?;

        match method.parse::<ValidationMethod>() {
            Ok(method) => self.run(dataset, method, custom_query),
            Err(e) => {
                warn!(dataset = %dataset.id, "{}", e);
                let result = ValidationResult::new(
                    "Validation Method",
                    CheckStatus::Warning,
                    format!("Validation method '{}' is not implemented", method.trim()),
                )
                .with_category(CheckCategory::General);
                Ok(Self::stamp_batch(dataset, vec![result]))
            }
        }
    }

    /// Validate a dataset with a known method.
    pub fn run(
        &self,
        dataset: &Dataset,
        method: ValidationMethod,
        custom_query: Option<&str>,
    ) -> Result<Vec<ValidationResult>> {
        Self::ensure_content(dataset)?;

        let mut results = Vec::new();
        for validator in self.validators_for(method, custom_query) {
            results.extend(validator.validate(dataset));
        }

        debug!(
            dataset = %dataset.id,
            method = %method,
            results = results.len(),
            issues = results.iter().filter(|r| r.status.is_issue()).count(),
            "validation finished"
        );

        Ok(Self::stamp_batch(dataset, results))
    }

    fn ensure_content(dataset: &Dataset) -> Result<()> {
        if dataset.has_content() {
            Ok(())
        } else {
            Err(DataproofError::DatasetHasNoContent { dataset_id: dataset.id.clone() })
        }
    }

    fn stamp_batch(dataset: &Dataset, mut results: Vec<ValidationResult>) -> Vec<ValidationResult> {
        let now = Utc::now();
        for (index, result) in results.iter_mut().enumerate() {
            result.stamp(&dataset.id, now, index);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::from_string_rows(
            "ds_1",
            "people",
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    fn checks(results: &[ValidationResult]) -> Vec<&str> {
        results.iter().map(|r| r.check.as_str()).collect()
    }

    #[test]
    fn test_method_names() {
        for method in ValidationMethod::ALL {
            assert_eq!(method.as_str().parse::<ValidationMethod>().unwrap(), method);
        }
        assert_eq!(" Basic ".parse::<ValidationMethod>().unwrap(), ValidationMethod::Basic);
        assert!(matches!(
            "fuzzy".parse::<ValidationMethod>(),
            Err(DataproofError::UnknownMethod(name)) if name == "fuzzy"
        ));
    }

    #[test]
    fn test_basic_runs_row_count_and_missing_values() {
        let ds = make_dataset(vec!["id", "email"], vec![vec!["1", "a@x.com"]]);
        let results = ValidationEngine::new().validate(&ds, "basic", None).unwrap();

        assert_eq!(checks(&results), vec!["Row Count", "Missing Values"]);
        assert!(results.iter().all(|r| r.status == CheckStatus::Pass));
    }

    #[test]
    fn test_batch_is_stamped() {
        let ds = make_dataset(vec!["id"], vec![vec!["1"]]);
        let results = ValidationEngine::new().validate(&ds, "basic", None).unwrap();

        let millis = results[0].timestamp.timestamp_millis();
        assert_eq!(results[0].id, format!("vr_{}_0", millis));
        assert_eq!(results[1].id, format!("vr_{}_1", millis));
        assert!(
            results
                .iter()
                .all(|r| r.dataset_id == "ds_1" && r.timestamp == results[0].timestamp)
        );
    }

    #[test]
    fn test_advanced_adds_quality_checks() {
        let ds = make_dataset(
            vec!["id", "age"],
            vec![vec!["1", "30"], vec!["2", "N/A"], vec!["3", "41"]],
        );
        let results = ValidationEngine::new().validate(&ds, "advanced", None).unwrap();

        assert_eq!(
            checks(&results),
            vec![
                "Row Count",
                "Missing Values",
                "Type Consistency",
                "Duplicate Detection",
                "Anomaly Detection"
            ]
        );
        let types = &results[2];
        assert_eq!(types.status, CheckStatus::Fail);
        assert_eq!(types.affected_columns, vec!["age"]);
    }

    #[test]
    fn test_unknown_method_degrades_to_warning() {
        let ds = make_dataset(vec!["id"], vec![vec!["1"]]);
        let results = ValidationEngine::new().validate(&ds, "fuzzy_match", None).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert!(results[0].details.contains("fuzzy_match"));
    }

    #[test]
    fn test_no_headers_is_an_error() {
        let ds = make_dataset(vec![], vec![]);
        let err = ValidationEngine::new().validate(&ds, "basic", None).unwrap_err();
        assert!(matches!(
            err,
            DataproofError::DatasetHasNoContent { dataset_id } if dataset_id == "ds_1"
        ));
    }

    #[test]
    fn test_headers_without_rows_still_validate() {
        let ds = make_dataset(vec!["id"], vec![]);
        let results = ValidationEngine::new().validate(&ds, "basic", None).unwrap();
        assert_eq!(results[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_every_method_produces_results() {
        let ds = make_dataset(
            vec!["id", "name", "gender", "score"],
            vec![vec!["1", "ANA", "F", "3.5"], vec!["2", "LUIS", "M", "4.0"]],
        );
        let engine = ValidationEngine::new();
        for method in ValidationMethod::ALL {
            let results = engine
                .run(&ds, method, Some("SELECT * FROM t WHERE score > 3"))
                .unwrap();
            assert!(!results.is_empty(), "{} produced no results", method);
        }
    }
}
