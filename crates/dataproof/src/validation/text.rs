//! Text-pattern analysis: casing, known formats, word counts and dominant
//! leading/trailing words.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TextConfig;
use crate::dataset::Dataset;
use crate::schema::parse_number;

use super::checks::{quote_examples, Validator};
use super::result::{CheckCategory, CheckStatus, ValidationResult};
use super::statistics::coefficient_of_variation;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://|www\.)[^\s]+$").unwrap());

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?(\d{1,3}[\s\-.]?)?(\(\d{3}\)|\d{3})[\s\-.]?\d{3}[\s\-.]?\d{4}$").unwrap()
});

/// Letter casing of a text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Casing {
    Upper,
    Lower,
    Title,
    Mixed,
}

impl Casing {
    pub fn label(self) -> &'static str {
        match self {
            Casing::Upper => "upper case",
            Casing::Lower => "lower case",
            Casing::Title => "title case",
            Casing::Mixed => "mixed case",
        }
    }
}

/// Classify a value's casing; `None` when it contains no letters.
pub fn classify_casing(value: &str) -> Option<Casing> {
    if !value.chars().any(char::is_alphabetic) {
        return None;
    }

    let has_lower = value.chars().any(char::is_lowercase);
    let has_upper = value.chars().any(char::is_uppercase);

    if !has_lower {
        return Some(Casing::Upper);
    }
    if !has_upper {
        return Some(Casing::Lower);
    }

    let title = value.split_whitespace().all(|word| {
        let mut letters = word.chars().filter(|c| c.is_alphabetic());
        match letters.next() {
            Some(first) => first.is_uppercase() && letters.all(char::is_lowercase),
            None => true,
        }
    });

    Some(if title { Casing::Title } else { Casing::Mixed })
}

/// Recognized value formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextFormat {
    Email,
    Url,
    Phone,
}

impl TextFormat {
    const ALL: [TextFormat; 3] = [TextFormat::Email, TextFormat::Url, TextFormat::Phone];

    pub fn label(self) -> &'static str {
        match self {
            TextFormat::Email => "email",
            TextFormat::Url => "URL",
            TextFormat::Phone => "phone",
        }
    }

    pub fn matches(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            TextFormat::Email => EMAIL_PATTERN.is_match(value),
            TextFormat::Url => URL_PATTERN.is_match(value),
            TextFormat::Phone => PHONE_PATTERN.is_match(value),
        }
    }
}

/// Best-matching format of a text column.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatProfile {
    pub format: TextFormat,
    /// Share of values matching `format`.
    pub rate: f64,
    /// Rows whose value does not match.
    pub mismatched_rows: Vec<usize>,
}

/// Find the format most values match. `None` if no value matches any.
pub fn detect_format(cells: &[(usize, String)]) -> Option<FormatProfile> {
    if cells.is_empty() {
        return None;
    }

    let mut best: Option<(TextFormat, usize)> = None;
    for format in TextFormat::ALL {
        let hits = cells.iter().filter(|(_, v)| format.matches(v)).count();
        if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
            best = Some((format, hits));
        }
    }

    let (format, hits) = best?;
    Some(FormatProfile {
        format,
        rate: hits as f64 / cells.len() as f64,
        mismatched_rows: cells
            .iter()
            .filter(|(_, v)| !format.matches(v))
            .map(|(row, _)| *row)
            .collect(),
    })
}

/// Non-empty values of a column with their row index, provided fewer than
/// `max_numeric_ratio` of them parse as numbers.
pub fn text_column(
    dataset: &Dataset,
    column: &str,
    max_numeric_ratio: f64,
) -> Option<Vec<(usize, String)>> {
    let cells: Vec<(usize, String)> = dataset
        .non_empty_cells(column)
        .map(|(row, text)| (row, text.trim().to_string()))
        .collect();
    if cells.is_empty() {
        return None;
    }

    let numeric = cells.iter().filter(|(_, v)| parse_number(v).is_some()).count();
    if (numeric as f64) < max_numeric_ratio * cells.len() as f64 {
        Some(cells)
    } else {
        None
    }
}

/// Casing, format, word-count and affix analysis of text columns.
pub struct TextPatternValidator {
    config: TextConfig,
    max_examples: usize,
}

impl TextPatternValidator {
    pub fn new(config: TextConfig, max_examples: usize) -> Self {
        Self { config, max_examples }
    }

    fn casing(&self, column: &str, cells: &[(usize, String)]) -> Option<ValidationResult> {
        let classified: Vec<(usize, &str, Casing)> = cells
            .iter()
            .filter_map(|(row, v)| classify_casing(v).map(|c| (*row, v.as_str(), c)))
            .collect();
        if classified.is_empty() {
            return None;
        }

        let mut counts: HashMap<Casing, usize> = HashMap::new();
        for (_, _, casing) in &classified {
            *counts.entry(*casing).or_default() += 1;
        }

        let total = classified.len() as f64;
        let predominant = [Casing::Upper, Casing::Lower, Casing::Title]
            .into_iter()
            .map(|c| (c, counts.get(&c).copied().unwrap_or(0)))
            .filter(|(_, n)| *n as f64 >= self.config.casing_threshold * total)
            .max_by_key(|(_, n)| *n);

        let check = format!("Text Casing ({})", column);
        let result = match predominant {
            Some((casing, n)) if n == classified.len() => ValidationResult::new(
                check,
                CheckStatus::Pass,
                format!("All values of '{}' are {}", column, casing.label()),
            ),
            Some((casing, n)) => {
                let deviating: Vec<(usize, &str)> = classified
                    .iter()
                    .filter(|(_, _, c)| *c != casing)
                    .map(|(row, v, _)| (*row, *v))
                    .collect();
                let examples: Vec<&str> = deviating.iter().map(|(_, v)| *v).collect();
                ValidationResult::new(
                    check,
                    CheckStatus::Warning,
                    format!(
                        "'{}' is mostly {} ({:.0}%), but {} value(s) differ, e.g. {}",
                        column,
                        casing.label(),
                        n as f64 / total * 100.0,
                        deviating.len(),
                        quote_examples(&examples, self.max_examples)
                    ),
                )
                .with_rows(deviating.into_iter().map(|(row, _)| row).collect())
            }
            None => ValidationResult::new(
                check,
                CheckStatus::Info,
                format!("No predominant casing in '{}'", column),
            ),
        };

        Some(result)
    }

    fn format(&self, column: &str, cells: &[(usize, String)]) -> Option<ValidationResult> {
        let profile = detect_format(cells)?;
        if profile.rate < self.config.format_detect_ratio {
            return None;
        }

        let check = format!("Text Format ({})", column);
        let label = profile.format.label();
        let result = if profile.rate < self.config.format_consistent_ratio {
            ValidationResult::new(
                check,
                CheckStatus::Warning,
                format!(
                    "'{}' looks like a {} column but only {:.0}% of values match",
                    column,
                    label,
                    profile.rate * 100.0
                ),
            )
            .with_rows(profile.mismatched_rows)
        } else {
            ValidationResult::new(
                check,
                CheckStatus::Pass,
                format!(
                    "{:.0}% of '{}' values are valid {} values",
                    profile.rate * 100.0,
                    column,
                    label
                ),
            )
        };

        Some(result)
    }

    fn word_counts(&self, column: &str, words: &[Vec<&str>]) -> Option<ValidationResult> {
        let counts: Vec<f64> = words.iter().map(|w| w.len() as f64).collect();
        let avg = counts.iter().sum::<f64>() / counts.len() as f64;
        if avg <= 1.0 {
            return None;
        }

        let cv = coefficient_of_variation(&counts);
        let check = format!("Word Count Consistency ({})", column);
        Some(if cv < self.config.word_count_cv_threshold {
            ValidationResult::new(
                check,
                CheckStatus::Pass,
                format!("'{}' values have a consistent word count (avg {:.1})", column, avg),
            )
        } else {
            ValidationResult::new(
                check,
                CheckStatus::Info,
                format!("'{}' word counts vary widely (avg {:.1}, CV {:.2})", column, avg, cv),
            )
        })
    }

    fn affixes(&self, column: &str, words: &[Vec<&str>]) -> Vec<ValidationResult> {
        let total = words.len();
        let avg = words.iter().map(Vec::len).sum::<usize>() as f64 / total as f64;
        if avg >= self.config.affix_max_avg_words {
            return Vec::new();
        }

        let mut first: HashMap<String, usize> = HashMap::new();
        let mut last: HashMap<String, usize> = HashMap::new();
        for value in words.iter().filter(|w| w.len() >= 2) {
            *first.entry(value[0].to_lowercase()).or_default() += 1;
            *last.entry(value[value.len() - 1].to_lowercase()).or_default() += 1;
        }

        let mut results = Vec::new();
        for (position, counts) in [("first", first), ("last", last)] {
            let Some((word, n)) = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            else {
                continue;
            };
            let share = n as f64 / total as f64;
            if share > self.config.affix_share_threshold {
                let check = if position == "first" { "Common Prefix" } else { "Common Suffix" };
                results.push(ValidationResult::new(
                    format!("{} ({})", check, column),
                    CheckStatus::Info,
                    format!(
                        "{:.0}% of '{}' values share the {} word '{}'",
                        share * 100.0,
                        column,
                        position,
                        word
                    ),
                ));
            }
        }
        results
    }
}

impl Default for TextPatternValidator {
    fn default() -> Self {
        Self::new(TextConfig::default(), 3)
    }
}

impl Validator for TextPatternValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut analyzed = 0;

        for header in &dataset.headers {
            let Some(cells) = text_column(dataset, header, self.config.max_numeric_ratio) else {
                continue;
            };
            analyzed += 1;

            let words: Vec<Vec<&str>> = cells
                .iter()
                .map(|(_, v)| v.split_whitespace().collect())
                .collect();

            let column_results = self
                .casing(header, &cells)
                .into_iter()
                .chain(self.format(header, &cells))
                .chain(self.word_counts(header, &words))
                .chain(self.affixes(header, &words));

            results.extend(column_results.map(|r| {
                r.with_category(CheckCategory::TextPattern)
                    .with_column(header.as_str())
            }));
        }

        if analyzed == 0 {
            results.push(
                ValidationResult::new(
                    "Text Pattern Analysis",
                    CheckStatus::Info,
                    "No text columns found for pattern analysis",
                )
                .with_category(CheckCategory::TextPattern),
            );
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_column(name: &str, values: &[&str]) -> Dataset {
        Dataset::from_string_rows(
            "text",
            "text",
            vec![name.to_string()],
            values.iter().map(|v| vec![v.to_string()]).collect(),
        )
    }

    fn find<'a>(results: &'a [ValidationResult], prefix: &str) -> Option<&'a ValidationResult> {
        results.iter().find(|r| r.check.starts_with(prefix))
    }

    #[test]
    fn test_classify_casing() {
        assert_eq!(classify_casing("HELLO WORLD"), Some(Casing::Upper));
        assert_eq!(classify_casing("hello world"), Some(Casing::Lower));
        assert_eq!(classify_casing("Hello World"), Some(Casing::Title));
        assert_eq!(classify_casing("hELLo"), Some(Casing::Mixed));
        assert_eq!(classify_casing("O'Brien Jr."), Some(Casing::Mixed));
        assert_eq!(classify_casing("12-34"), None);
    }

    #[test]
    fn test_formats() {
        assert!(TextFormat::Email.matches("a@x.com"));
        assert!(!TextFormat::Email.matches("a@x"));
        assert!(TextFormat::Url.matches("https://example.org/page"));
        assert!(TextFormat::Url.matches("WWW.example.org"));
        assert!(TextFormat::Phone.matches("+1 (555) 123-4567"));
        assert!(TextFormat::Phone.matches("555.123.4567"));
        assert!(!TextFormat::Phone.matches("2024-01-05"));
        assert!(!TextFormat::Phone.matches("call me"));
    }

    #[test]
    fn test_text_column_excludes_numeric() {
        let ds = make_column("v", &["1", "2", "3", "x"]);
        assert!(text_column(&ds, "v", 0.3).is_none());

        let ds = make_column("v", &["a", "b", "c", "4"]);
        assert_eq!(text_column(&ds, "v", 0.3).unwrap().len(), 4);
    }

    #[test]
    fn test_casing_inconsistency_warns() {
        let mut values = vec!["ALPHA"; 8];
        values.push("beta");
        values.push("gamma");
        let results = TextPatternValidator::default().validate(&make_column("code", &values));

        let casing = find(&results, "Text Casing").unwrap();
        assert_eq!(casing.status, CheckStatus::Warning);
        assert_eq!(casing.affected_rows, vec![8, 9]);
        assert!(casing.details.contains("\"beta\""));
    }

    #[test]
    fn test_no_predominant_casing_is_info() {
        let ds = make_column("v", &["AA", "bb", "Cc", "DD", "ee"]);
        let results = TextPatternValidator::default().validate(&ds);
        assert_eq!(find(&results, "Text Casing").unwrap().status, CheckStatus::Info);
    }

    #[test]
    fn test_format_inconsistency() {
        let mut values = vec!["user@example.com"; 8];
        values.push("nobody");
        values.push("n/a");
        let results = TextPatternValidator::default().validate(&make_column("contact", &values));

        let format = find(&results, "Text Format").unwrap();
        assert_eq!(format.status, CheckStatus::Warning);
        assert_eq!(format.affected_rows, vec![8, 9]);

        let clean = TextPatternValidator::default()
            .validate(&make_column("contact", &["a@x.com", "b@y.org", "c@z.net"]));
        assert_eq!(find(&clean, "Text Format").unwrap().status, CheckStatus::Pass);
    }

    #[test]
    fn test_word_count_and_prefix() {
        let results = TextPatternValidator::default()
            .validate(&make_column("doctor", &["Dr Smith", "Dr Jones", "Dr Brown", "Ms Green"]));

        assert_eq!(find(&results, "Word Count").unwrap().status, CheckStatus::Pass);
        let prefix = find(&results, "Common Prefix").unwrap();
        assert_eq!(prefix.status, CheckStatus::Info);
        assert!(prefix.details.contains("'dr'"));
        assert!(find(&results, "Common Suffix").is_none());
    }

    #[test]
    fn test_single_words_skip_word_count() {
        let results = TextPatternValidator::default().validate(&make_column("v", &["a", "b", "c"]));
        assert!(find(&results, "Word Count").is_none());
    }

    #[test]
    fn test_no_text_columns() {
        let results = TextPatternValidator::default().validate(&make_column("n", &["1", "2"]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Info);
    }
}
