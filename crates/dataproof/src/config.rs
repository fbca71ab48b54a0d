//! Thresholds for the validation engine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataproofError, Result};

/// Configuration for the statistical (outlier/distribution) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Minimum share of non-empty values that must parse as numbers.
    pub numeric_column_ratio: f64,
    /// IQR multiplier for outlier bounds.
    pub iqr_multiplier: f64,
    /// |skewness| below this passes the normality check.
    pub skew_threshold: f64,
    /// Outlier ratio below this passes.
    pub outlier_pass_ratio: f64,
    /// Outlier ratio below this warns; at or above it fails.
    pub outlier_warn_ratio: f64,
    /// Histogram bins for the uniformity check.
    pub histogram_bins: usize,
    /// Coefficient of variation of bin counts below this means uniform.
    pub uniform_cv_threshold: f64,
    /// |r| above this is reported as a strong correlation.
    pub correlation_threshold: f64,
    /// Column pairs with fewer paired values are skipped.
    pub min_correlation_samples: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            numeric_column_ratio: 0.5,
            iqr_multiplier: 1.5,
            skew_threshold: 0.5,
            outlier_pass_ratio: 0.01,
            outlier_warn_ratio: 0.05,
            histogram_bins: 10,
            uniform_cv_threshold: 0.5,
            correlation_threshold: 0.7,
            min_correlation_samples: 10,
        }
    }
}

/// Configuration for the text-pattern analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Columns whose numeric share is below this are treated as text.
    pub max_numeric_ratio: f64,
    /// Share of values needed for a casing to be predominant.
    pub casing_threshold: f64,
    /// Share of values matching a known format before it is assumed.
    pub format_detect_ratio: f64,
    /// Match rate below this (once a format is assumed) is inconsistent.
    pub format_consistent_ratio: f64,
    /// Coefficient of variation of word counts below this is consistent.
    pub word_count_cv_threshold: f64,
    /// Affix detection only runs for columns averaging fewer words.
    pub affix_max_avg_words: f64,
    /// Share of values a first/last word must exceed to be dominant.
    pub affix_share_threshold: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_numeric_ratio: 0.3,
            casing_threshold: 0.7,
            format_detect_ratio: 0.5,
            format_consistent_ratio: 0.9,
            word_count_cv_threshold: 0.5,
            affix_max_avg_words: 5.0,
            affix_share_threshold: 0.5,
        }
    }
}

/// Configuration for the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows re-scanned when checking type consistency.
    pub type_sample_size: usize,
    /// Missing-cell ratio at or above which completeness fails.
    pub missing_fail_ratio: f64,
    /// Offending values quoted in result details.
    pub max_examples: usize,
    pub statistics: StatisticsConfig,
    pub text: TextConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            type_sample_size: 100,
            missing_fail_ratio: 0.05,
            max_examples: 3,
            statistics: StatisticsConfig::default(),
            text: TextConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| DataproofError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: EngineConfig = serde_json::from_str(&contents).map_err(|e| {
            DataproofError::Config(format!("invalid config '{}': {}", path.display(), e))
        })?;
        config.check()?;
        Ok(config)
    }

    /// Reject thresholds that would make the checks meaningless.
    pub fn check(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.missing_fail_ratio) {
            return Err(DataproofError::Config(format!(
                "missing_fail_ratio must be within [0, 1], got {}",
                self.missing_fail_ratio
            )));
        }
        if self.statistics.histogram_bins == 0 {
            return Err(DataproofError::Config(
                "statistics.histogram_bins must be positive".to_string(),
            ));
        }
        if self.statistics.outlier_pass_ratio > self.statistics.outlier_warn_ratio {
            return Err(DataproofError::Config(
                "statistics.outlier_pass_ratio must not exceed outlier_warn_ratio".to_string(),
            ));
        }
        Ok(())
    }
}
