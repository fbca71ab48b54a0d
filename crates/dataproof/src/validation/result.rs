//! Validation result types and dataset status derivation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single check.
///
/// Variants are declared in ascending severity, so the derived ordering puts
/// `Fail` above `Warning` above `Info`/`Pass`. `Pass` and `Info` carry the same
/// severity; see [`CheckStatus::severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    Pass,
    Info,
    Warning,
    Fail,
}

impl CheckStatus {
    /// Severity rank: 0 for Pass/Info, 1 for Warning, 2 for Fail.
    pub fn severity(self) -> u8 {
        match self {
            CheckStatus::Pass | CheckStatus::Info => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Fail => 2,
        }
    }

    /// Whether this status marks a data problem.
    pub fn is_issue(self) -> bool {
        self.severity() > 0
    }

    /// Get a human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "Pass",
            CheckStatus::Info => "Info",
            CheckStatus::Warning => "Warning",
            CheckStatus::Fail => "Fail",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Family a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Completeness,
    Consistency,
    Uniqueness,
    Statistical,
    TextPattern,
    Format,
    Custom,
    General,
}

/// One typed, severity-tagged validation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// `vr_<unix millis>_<index in batch>`; assigned when the batch is stamped.
    pub id: String,
    pub dataset_id: String,
    pub timestamp: DateTime<Utc>,
    /// Human label of the check.
    pub check: String,
    pub status: CheckStatus,
    /// Human message.
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CheckCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_rows: Vec<usize>,
}

impl ValidationResult {
    /// Create an unstamped result.
    pub fn new(check: impl Into<String>, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            dataset_id: String::new(),
            timestamp: Utc::now(),
            check: check.into(),
            status,
            details: details.into(),
            category: None,
            affected_columns: Vec::new(),
            affected_rows: Vec::new(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: CheckCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set a single affected column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.affected_columns = vec![column.into()];
        self
    }

    /// Set the affected columns.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.affected_columns = columns;
        self
    }

    /// Set the affected row indices.
    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.affected_rows = rows;
        self
    }

    /// Assign batch identity.
    pub(crate) fn stamp(&mut self, dataset_id: &str, timestamp: DateTime<Utc>, index: usize) {
        self.id = format!("vr_{}_{}", timestamp.timestamp_millis(), index);
        self.dataset_id = dataset_id.to_string();
        self.timestamp = timestamp;
    }
}

/// Dataset-level status derived from its latest validation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetStatus {
    #[serde(rename = "Not Validated")]
    NotValidated,
    #[serde(rename = "Issues Found")]
    IssuesFound,
    Validated,
}

impl DatasetStatus {
    pub fn label(self) -> &'static str {
        match self {
            DatasetStatus::NotValidated => "Not Validated",
            DatasetStatus::IssuesFound => "Issues Found",
            DatasetStatus::Validated => "Validated",
        }
    }
}

impl fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Highest-severity status in a batch, if any.
pub fn worst_status(results: &[ValidationResult]) -> Option<CheckStatus> {
    results.iter().map(|r| r.status).max()
}

/// Derive a dataset's status from its most recent batch.
///
/// Total: an empty batch is `NotValidated`; any Warning or Fail is
/// `IssuesFound`; otherwise `Validated`.
pub fn derive_status(results: &[ValidationResult]) -> DatasetStatus {
    match worst_status(results) {
        None => DatasetStatus::NotValidated,
        Some(status) if status.is_issue() => DatasetStatus::IssuesFound,
        Some(_) => DatasetStatus::Validated,
    }
}
