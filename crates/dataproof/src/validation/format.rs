//! Column format rules and allowed-value lookups, selected by header name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::Dataset;

use super::checks::{quote_examples, Validator};
use super::result::{CheckCategory, CheckStatus, ValidationResult};

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}$").unwrap());

static BASIC_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// A rule applied to every column whose header has one of `keywords` as a
/// whole word.
struct ColumnRule {
    check: &'static str,
    keywords: &'static [&'static str],
    /// Describes valid values in failure messages.
    requirement: &'static str,
    accepts: fn(&str) -> bool,
}

impl ColumnRule {
    fn applies_to(&self, header: &str) -> bool {
        header_words(header)
            .iter()
            .any(|word| self.keywords.contains(&word.as_str()))
    }

    fn check_column(
        &self,
        dataset: &Dataset,
        column: &str,
        max_examples: usize,
    ) -> ValidationResult {
        let mut rows = Vec::new();
        let mut examples = Vec::new();
        let mut checked = 0;

        for (row, text) in dataset.non_empty_cells(column) {
            checked += 1;
            let value = text.trim();
            if !(self.accepts)(value) {
                rows.push(row);
                if examples.len() < max_examples {
                    examples.push(value.to_string());
                }
            }
        }

        let check = format!("{} ({})", self.check, column);
        let result = if rows.is_empty() {
            ValidationResult::new(
                check,
                CheckStatus::Pass,
                format!("All {} value(s) in '{}' are valid", checked, column),
            )
        } else {
            ValidationResult::new(
                check,
                CheckStatus::Fail,
                format!(
                    "{} of {} value(s) in '{}' do not {}, e.g. {}",
                    rows.len(),
                    checked,
                    column,
                    self.requirement,
                    quote_examples(&examples, max_examples)
                ),
            )
            .with_rows(rows)
        };

        result.with_category(CheckCategory::Format).with_column(column)
    }
}

/// Lower-cased words of a header, split on punctuation, whitespace and
/// camelCase boundaries: `DateOfBirth` and `date_of_birth` both give
/// `date, of, birth`.
fn header_words(header: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in header.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn run_rules(
    dataset: &Dataset,
    rules: &[ColumnRule],
    max_examples: usize,
    family: &str,
) -> Vec<ValidationResult> {
    let mut results = Vec::new();

    for header in &dataset.headers {
        for rule in rules.iter().filter(|r| r.applies_to(header)) {
            results.push(rule.check_column(dataset, header, max_examples));
        }
    }

    if results.is_empty() {
        results.push(
            ValidationResult::new(
                family,
                CheckStatus::Info,
                format!("No columns eligible for {}", family.to_lowercase()),
            )
            .with_category(CheckCategory::Format),
        );
    }

    results
}

fn is_uppercase(value: &str) -> bool {
    value == value.to_uppercase()
}

fn is_date(value: &str) -> bool {
    DATE_FORMAT.is_match(value)
}

fn is_lowercase_email(value: &str) -> bool {
    BASIC_EMAIL.is_match(value) && value == value.to_lowercase()
}

fn is_gender_code(value: &str) -> bool {
    matches!(value, "F" | "M")
}

fn is_marital_code(value: &str) -> bool {
    matches!(value, "S" | "M")
}

const FORMAT_RULES: &[ColumnRule] = &[
    ColumnRule {
        check: "Name Format",
        keywords: &["name", "nombre"],
        requirement: "be upper case",
        accepts: is_uppercase,
    },
    ColumnRule {
        check: "Date Format",
        keywords: &["date", "fecha"],
        requirement: "match YYYY/MM/DD",
        accepts: is_date,
    },
    ColumnRule {
        check: "Email Format",
        keywords: &["email", "mail", "correo"],
        requirement: "be valid lower-case emails",
        accepts: is_lowercase_email,
    },
];

const LOOKUP_RULES: &[ColumnRule] = &[
    ColumnRule {
        check: "Gender Values",
        keywords: &["gender", "sex", "sexo", "genero", "género"],
        requirement: "be one of F, M",
        accepts: is_gender_code,
    },
    ColumnRule {
        check: "Marital Status Values",
        keywords: &["marital", "civil"],
        requirement: "be one of S, M",
        accepts: is_marital_code,
    },
];

/// Name, date and email format rules.
pub struct FormatChecksValidator {
    max_examples: usize,
}

impl FormatChecksValidator {
    pub fn new(max_examples: usize) -> Self {
        Self { max_examples }
    }
}

impl Default for FormatChecksValidator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Validator for FormatChecksValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        run_rules(dataset, FORMAT_RULES, self.max_examples, "Format Checks")
    }
}

/// Gender and marital-status code lookups.
pub struct ValueLookupValidator {
    max_examples: usize,
}

impl ValueLookupValidator {
    pub fn new(max_examples: usize) -> Self {
        Self { max_examples }
    }
}

impl Default for ValueLookupValidator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Validator for ValueLookupValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        run_rules(dataset, LOOKUP_RULES, self.max_examples, "Value Lookup")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::from_string_rows(
            "fmt",
            "fmt",
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_name_must_be_uppercase() {
        let ds = make_dataset(
            vec!["first_name"],
            vec![vec!["ANA"], vec!["Luis"], vec!["MARÍA"], vec![""]],
        );
        let results = FormatChecksValidator::default().validate(&ds);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].check, "Name Format (first_name)");
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[0].affected_rows, vec![1]);
        assert!(results[0].details.contains("\"Luis\""));
    }

    #[test]
    fn test_date_and_email_rules() {
        let ds = make_dataset(
            vec!["fecha_alta", "correo"],
            vec![
                vec!["2024/01/05", "ana@x.com"],
                vec!["2024-1-5", "Luis@x.com"],
                vec!["05/01/2024", "bad"],
            ],
        );
        let results = FormatChecksValidator::default().validate(&ds);

        let date = results.iter().find(|r| r.check.starts_with("Date")).unwrap();
        assert_eq!(date.status, CheckStatus::Fail);
        assert_eq!(date.affected_rows, vec![2]);

        let email = results.iter().find(|r| r.check.starts_with("Email")).unwrap();
        assert_eq!(email.affected_rows, vec![1, 2]);
    }

    #[test]
    fn test_examples_capped() {
        let ds = make_dataset(vec!["name"], vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]]);
        let results = FormatChecksValidator::default().validate(&ds);
        assert!(results[0].details.ends_with("\"a\", \"b\", \"c\""));
        assert_eq!(results[0].affected_rows.len(), 4);
    }

    #[test]
    fn test_value_lookup() {
        let ds = make_dataset(
            vec!["Sexo", "estado_civil"],
            vec![vec!["F", "S"], vec!["M", "M"], vec!["X", "S"]],
        );
        let results = ValueLookupValidator::default().validate(&ds);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[0].affected_rows, vec![2]);
        assert_eq!(results[1].status, CheckStatus::Pass);
    }

    #[test]
    fn test_header_words() {
        assert_eq!(header_words("date_of_birth"), vec!["date", "of", "birth"]);
        assert_eq!(header_words("DateOfBirth"), vec!["date", "of", "birth"]);
        assert_eq!(header_words("e-mail Address"), vec!["e", "mail", "address"]);
        assert_eq!(header_words("NAME"), vec!["name"]);
        assert_eq!(header_words("Género"), vec!["género"]);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let ds = make_dataset(
            vec!["updated_by", "filename", "username", "lastName", "created-date"],
            vec![vec!["ana", "a.csv", "ana", "Lopez", "2024/01/05"]],
        );
        let results = FormatChecksValidator::default().validate(&ds);

        let checks: Vec<&str> = results.iter().map(|r| r.check.as_str()).collect();
        assert_eq!(checks, vec!["Name Format (lastName)", "Date Format (created-date)"]);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[1].status, CheckStatus::Pass);
    }

    #[test]
    fn test_no_matching_columns() {
        let ds = make_dataset(vec!["amount"], vec![vec!["1"]]);
        let results = ValueLookupValidator::default().validate(&ds);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, CheckStatus::Info);
    }
}
