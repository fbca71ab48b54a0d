//! Numeric distribution analysis: moments, quartiles, outliers, uniformity
//! and pairwise correlation.

use serde::{Deserialize, Serialize};

use crate::config::StatisticsConfig;
use crate::dataset::Dataset;
use crate::schema::parse_number;

use super::checks::Validator;
use super::result::{CheckCategory, CheckStatus, ValidationResult};

// =============================================================================
// STREAMING MOMENTS
// =============================================================================
// Welford's online update extended to the third central moment, so mean,
// variance and skewness come out of a single pass.

#[derive(Debug, Clone)]
struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
    m3: f64,
    min: f64,
    max: f64,
}

impl RunningMoments {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            m3: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, value: f64) {
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;

        let delta = value - self.mean;
        let delta_n = delta / n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Population variance.
    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population skewness; zero when the values have no spread.
    fn skewness(&self) -> f64 {
        if self.count < 2 || self.m2 <= f64::EPSILON {
            return 0.0;
        }
        (self.count as f64).sqrt() * self.m3 / self.m2.powf(1.5)
    }
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub min: f64,
    pub max: f64,
    /// First quartile (`sorted[floor(n / 4)]`).
    pub q1: f64,
    /// Third quartile (`sorted[floor(3n / 4)]`).
    pub q3: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl NumericSummary {
    /// Summarize values; `None` when there are none.
    pub fn from_values(values: &[f64], iqr_multiplier: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut moments = RunningMoments::new();
        for &value in values {
            moments.add(value);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let q1 = sorted[n / 4];
        let q3 = sorted[(3 * n) / 4];
        let iqr = q3 - q1;

        Some(Self {
            count: n,
            mean: moments.mean,
            median,
            std_dev: moments.variance().sqrt(),
            skewness: moments.skewness(),
            min: moments.min,
            max: moments.max,
            q1,
            q3,
            lower_bound: q1 - iqr_multiplier * iqr,
            upper_bound: q3 + iqr_multiplier * iqr,
        })
    }

    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Whether a value falls outside the IQR bounds.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_bound || value > self.upper_bound
    }

    /// Row indices of outlying values.
    pub fn outlier_rows(&self, values: &[(usize, f64)]) -> Vec<usize> {
        values
            .iter()
            .filter(|(_, v)| self.is_outlier(*v))
            .map(|(row, _)| *row)
            .collect()
    }
}

/// Parsed numbers of a column with their row index, provided at least
/// `min_ratio` of its non-empty values are numeric.
pub fn numeric_column(
    dataset: &Dataset,
    column: &str,
    min_ratio: f64,
) -> Option<Vec<(usize, f64)>> {
    let mut non_empty = 0usize;
    let mut values = Vec::new();

    for (row, text) in dataset.non_empty_cells(column) {
        non_empty += 1;
        if let Some(number) = parse_number(&text) {
            values.push((row, number));
        }
    }

    if values.is_empty() || (values.len() as f64) < min_ratio * non_empty as f64 {
        None
    } else {
        Some(values)
    }
}

/// Counts per equal-width bin between the minimum and maximum.
pub fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    let width = (max - min) / bins as f64;

    for &value in values {
        let idx = if width > 0.0 {
            (((value - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    counts
}

/// Population standard deviation over mean; zero for an empty or zero-mean set.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean.abs()
}

/// Pearson correlation of paired samples; `None` if either side is constant.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Distribution, outlier, uniformity and correlation analysis of numeric columns.
pub struct StatisticalValidator {
    config: StatisticsConfig,
}

impl StatisticalValidator {
    pub fn new(config: StatisticsConfig) -> Self {
        Self { config }
    }

    fn analyze_column(
        &self,
        column: &str,
        values: &[(usize, f64)],
        summary: &NumericSummary,
    ) -> Vec<ValidationResult> {
        let mut results = Vec::with_capacity(4);

        let skew = summary.skewness;
        let (status, details) = if skew.abs() < self.config.skew_threshold {
            (
                CheckStatus::Pass,
                format!("'{}' is approximately symmetric (skewness {:.2})", column, skew),
            )
        } else {
            let direction = if skew > 0.0 { "right" } else { "left" };
            (
                CheckStatus::Warning,
                format!("'{}' is skewed {} (skewness {:.2})", column, direction, skew),
            )
        };
        results.push(ValidationResult::new(
            format!("Distribution Normality ({})", column),
            status,
            details,
        ));

        let outliers = summary.outlier_rows(values);
        let ratio = outliers.len() as f64 / summary.count as f64;
        let status = if ratio < self.config.outlier_pass_ratio {
            CheckStatus::Pass
        } else if ratio < self.config.outlier_warn_ratio {
            CheckStatus::Warning
        } else {
            CheckStatus::Fail
        };
        results.push(
            ValidationResult::new(
                format!("Outlier Detection ({})", column),
                status,
                format!(
                    "{} outlier(s) ({:.1}%) outside [{:.2}, {:.2}]",
                    outliers.len(),
                    ratio * 100.0,
                    summary.lower_bound,
                    summary.upper_bound
                ),
            )
            .with_rows(outliers),
        );

        let plain: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        let (status, details) = if summary.max > summary.min {
            let counts = histogram(&plain, summary.min, summary.max, self.config.histogram_bins);
            let counts: Vec<f64> = counts.into_iter().map(|c| c as f64).collect();
            let cv = coefficient_of_variation(&counts);
            if cv < self.config.uniform_cv_threshold {
                (
                    CheckStatus::Info,
                    format!("'{}' is roughly uniformly distributed (bin CV {:.2})", column, cv),
                )
            } else {
                (
                    CheckStatus::Pass,
                    format!("'{}' is not uniformly distributed (bin CV {:.2})", column, cv),
                )
            }
        } else {
            (
                CheckStatus::Info,
                format!("All values of '{}' are identical ({})", column, summary.min),
            )
        };
        results.push(ValidationResult::new(
            format!("Distribution Uniformity ({})", column),
            status,
            details,
        ));

        results.push(ValidationResult::new(
            format!("Statistical Summary ({})", column),
            CheckStatus::Info,
            format!(
                concat!(
                    "n={}, mean={:.2}, median={:.2}, std={:.2}, skewness={:.2}, ",
                    "Q1={:.2}, Q3={:.2}, IQR={:.2}, range=[{:.2}, {:.2}]"
                ),
                summary.count,
                summary.mean,
                summary.median,
                summary.std_dev,
                summary.skewness,
                summary.q1,
                summary.q3,
                summary.iqr(),
                summary.min,
                summary.max
            ),
        ));

        results
            .into_iter()
            .map(|r| r.with_category(CheckCategory::Statistical).with_column(column))
            .collect()
    }

    fn correlations(
        &self,
        dataset: &Dataset,
        columns: &[(String, Vec<(usize, f64)>)],
    ) -> ValidationResult {
        let mut strong = Vec::new();
        let mut involved = Vec::new();

        for (i, (name_a, values_a)) in columns.iter().enumerate() {
            for (name_b, values_b) in &columns[i + 1..] {
                let mut by_row = vec![None; dataset.row_count()];
                for (row, v) in values_a {
                    by_row[*row] = Some(*v);
                }
                let pairs: Vec<(f64, f64)> = values_b
                    .iter()
                    .filter_map(|(row, b)| by_row[*row].map(|a| (a, *b)))
                    .collect();

                if pairs.len() < self.config.min_correlation_samples {
                    continue;
                }
                if let Some(r) = pearson(&pairs) {
                    if r.abs() > self.config.correlation_threshold {
                        strong.push(format!("{} ~ {} (r = {:.2})", name_a, name_b, r));
                        for name in [name_a, name_b] {
                            if !involved.contains(name) {
                                involved.push(name.clone());
                            }
                        }
                    }
                }
            }
        }

        let details = if strong.is_empty() {
            format!("No strong correlations among {} numeric columns", columns.len())
        } else {
            format!("Strong correlations: {}", strong.join(", "))
        };

        ValidationResult::new("Correlation Analysis", CheckStatus::Info, details)
            .with_category(CheckCategory::Statistical)
            .with_columns(involved)
    }
}

impl Default for StatisticalValidator {
    fn default() -> Self {
        Self::new(StatisticsConfig::default())
    }
}

impl Validator for StatisticalValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let numeric: Vec<(String, Vec<(usize, f64)>)> = dataset
            .headers
            .iter()
            .filter_map(|h| {
                numeric_column(dataset, h, self.config.numeric_column_ratio).map(|v| (h.clone(), v))
            })
            .collect();

        if numeric.is_empty() {
            return vec![
                ValidationResult::new(
                    "Statistical Analysis",
                    CheckStatus::Info,
                    "No numeric columns found for statistical analysis",
                )
                .with_category(CheckCategory::Statistical),
            ];
        }

        let mut results = Vec::new();
        for (column, values) in &numeric {
            let plain: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
            if let Some(summary) = NumericSummary::from_values(&plain, self.config.iqr_multiplier) {
                results.extend(self.analyze_column(column, values, &summary));
            }
        }

        if numeric.len() >= 2 {
            results.push(self.correlations(dataset, &numeric));
        }

        results
    }
}
