//! A small single-table query grammar evaluated row by row.
//!
//! Supported shape: `SELECT <projection> FROM <table> [WHERE <clause>]`, where
//! the clause is one of `col IS [NOT] NULL`, `col LIKE 'pat'`, `col = value`,
//! `col IN (a, b, ...)` or a numeric comparison (`>`, `>=`, `<`, `<=`, `<>`,
//! `!=`). Anything else parses to [`Clause::Unrecognized`] and is not
//! evaluated.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::dataset::{cell_text, is_empty_cell, Dataset};
use crate::error::{DataproofError, Result};
use crate::schema::parse_number;

use super::checks::Validator;
use super::result::{CheckCategory, CheckStatus, ValidationResult};

// =============================================================================
// GRAMMAR
// =============================================================================

const IDENT: &str = r#"(?:[A-Za-z_][\w]*|"[^"]+"|`[^`]+`|\[[^\]]+\])"#;

static STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*SELECT\s+(.+?)\s+FROM\s+({IDENT}(?:\.{IDENT})?)(?:\s+WHERE\s+(.+?))?\s*;?\s*$"
    ))
    .unwrap()
});

static CONNECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s(AND|OR)\s").unwrap());

static NOT_NULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^({IDENT})\s+IS\s+NOT\s+NULL$")).unwrap());

static NULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^({IDENT})\s+IS\s+NULL$")).unwrap());

static LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#"(?i)^({IDENT})\s+LIKE\s+('[^']*'|"[^"]*")$"#)).unwrap()
});

static IN_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^({IDENT})\s+IN\s*\((.*)\)$")).unwrap());

static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({IDENT})\s*(>=|<=|<>|!=|>|<)\s*(-?\d+(?:\.\d+)?)$"
    ))
    .unwrap()
});

static EQUALITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({IDENT})\s*=\s*(.+)$")).unwrap());

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Ne,
}

impl CompareOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            "<>" | "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Ne => left != right,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Ne => "<>",
        }
    }
}

/// A parsed WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    NullCheck { column: String },
    NotNullCheck { column: String },
    Equality { column: String, value: String },
    Like { column: String, pattern: String },
    InClause { column: String, values: Vec<String> },
    Comparison { column: String, op: CompareOp, value: f64 },
    /// Raw clause text outside the supported grammar.
    Unrecognized(String),
}

impl Clause {
    /// Column the clause filters on.
    pub fn column(&self) -> Option<&str> {
        match self {
            Clause::NullCheck { column }
            | Clause::NotNullCheck { column }
            | Clause::Equality { column, .. }
            | Clause::Like { column, .. }
            | Clause::InClause { column, .. }
            | Clause::Comparison { column, .. } => Some(column),
            Clause::Unrecognized(_) => None,
        }
    }

    /// Whether matching rows indicate a problem rather than a met expectation.
    pub fn flags_problems(&self) -> bool {
        matches!(self, Clause::NullCheck { .. })
    }

    /// Row indices satisfying the clause, reading `column` (the dataset's
    /// spelling of the clause column). Unrecognized clauses match nothing.
    pub fn matching_rows(&self, dataset: &Dataset, column: &str) -> Vec<usize> {
        let like = match self {
            Clause::Like { pattern, .. } => like_to_regex(pattern),
            _ => None,
        };

        dataset
            .column_values(column)
            .enumerate()
            .filter(|(_, cell)| match self {
                Clause::NullCheck { .. } => is_empty_cell(*cell),
                Clause::NotNullCheck { .. } => !is_empty_cell(*cell),
                Clause::Equality { value, .. } => values_equal(cell_text(*cell).trim(), value),
                Clause::Like { .. } => like.as_ref().is_some_and(|re| {
                    !is_empty_cell(*cell) && re.is_match(cell_text(*cell).trim())
                }),
                Clause::InClause { values, .. } => {
                    let text = cell_text(*cell);
                    values.iter().any(|v| values_equal(text.trim(), v))
                }
                Clause::Comparison { op, value, .. } => {
                    parse_number(&cell_text(*cell)).is_some_and(|n| op.apply(n, *value))
                }
                Clause::Unrecognized(_) => false,
            })
            .map(|(row, _)| row)
            .collect()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::NullCheck { column } => write!(f, "{} IS NULL", column),
            Clause::NotNullCheck { column } => write!(f, "{} IS NOT NULL", column),
            Clause::Equality { column, value } => write!(f, "{} = '{}'", column, value),
            Clause::Like { column, pattern } => write!(f, "{} LIKE '{}'", column, pattern),
            Clause::InClause { column, values } => {
                write!(f, "{} IN ({})", column, values.join(", "))
            }
            Clause::Comparison { column, op, value } => {
                write!(f, "{} {} {}", column, op.symbol(), value)
            }
            Clause::Unrecognized(text) => f.write_str(text),
        }
    }
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Selected columns, `["*"]` for all.
    pub projection: Vec<String>,
    pub table: String,
    pub clause: Option<Clause>,
}

/// Parse a query string.
///
/// Fails with [`DataproofError::UnparseableQuery`] when the text is not a
/// `SELECT ... FROM ...` statement. An unsupported WHERE clause still parses,
/// as [`Clause::Unrecognized`].
pub fn parse_query(input: &str) -> Result<Query> {
    let caps = STATEMENT
        .captures(input)
        .ok_or_else(|| DataproofError::UnparseableQuery(input.trim().to_string()))?;

    let projection = caps[1]
        .split(',')
        .map(|c| strip_identifier(c.trim()).to_string())
        .filter(|c| !c.is_empty())
        .collect();

    Ok(Query {
        projection,
        table: strip_identifier(&caps[2]).to_string(),
        clause: caps.get(3).map(|m| parse_clause(m.as_str())),
    })
}

/// Replace the contents of quoted literals with `_`, so keywords inside
/// `'Tom and Jerry'` are not read as connectives.
fn mask_literals(text: &str) -> String {
    let mut quote = None;
    text.chars()
        .map(|c| match quote {
            Some(q) if c == q => {
                quote = None;
                c
            }
            Some(_) => '_',
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                c
            }
        })
        .collect()
}

/// Parse the text of a WHERE clause.
pub fn parse_clause(text: &str) -> Clause {
    let text = text.trim();
    let text = strip_parens(text);

    if CONNECTIVE.is_match(&mask_literals(text)) {
        return Clause::Unrecognized(text.to_string());
    }

    if let Some(caps) = NOT_NULL.captures(text) {
        return Clause::NotNullCheck { column: strip_identifier(&caps[1]).to_string() };
    }
    if let Some(caps) = NULL.captures(text) {
        return Clause::NullCheck { column: strip_identifier(&caps[1]).to_string() };
    }
    if let Some(caps) = LIKE.captures(text) {
        return Clause::Like {
            column: strip_identifier(&caps[1]).to_string(),
            pattern: strip_quotes(&caps[2]).to_string(),
        };
    }
    if let Some(caps) = IN_LIST.captures(text) {
        let values: Vec<String> = caps[2]
            .split(',')
            .map(|v| strip_quotes(v.trim()).to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !values.is_empty() {
            return Clause::InClause { column: strip_identifier(&caps[1]).to_string(), values };
        }
    }
    if let Some(caps) = COMPARISON.captures(text) {
        if let (Some(op), Ok(value)) = (CompareOp::parse(&caps[2]), caps[3].parse::<f64>()) {
            return Clause::Comparison { column: strip_identifier(&caps[1]).to_string(), op, value };
        }
    }
    if let Some(caps) = EQUALITY.captures(text) {
        return Clause::Equality {
            column: strip_identifier(&caps[1]).to_string(),
            value: strip_quotes(caps[2].trim()).to_string(),
        };
    }

    Clause::Unrecognized(text.to_string())
}

fn strip_parens(text: &str) -> &str {
    let mut text = text;
    while text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }
    text
}

fn strip_identifier(text: &str) -> &str {
    let text = text.trim();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if text.len() >= 2 && text.starts_with(open) && text.ends_with(close) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn values_equal(cell: &str, expected: &str) -> bool {
    if cell == expected {
        return true;
    }
    matches!((parse_number(cell), parse_number(expected)), (Some(a), Some(b)) if a == b)
}

/// Translate a LIKE pattern (`%` any run, `_` one char) into an anchored,
/// case-insensitive regex.
fn like_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("(?is)^");
    for c in pattern.chars() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

/// Evaluates a custom query against the dataset.
pub struct CustomQueryValidator {
    query: Option<String>,
}

impl CustomQueryValidator {
    pub fn new(query: Option<&str>) -> Self {
        Self { query: query.map(str::to_string) }
    }

    fn result(status: CheckStatus, details: impl Into<String>) -> ValidationResult {
        ValidationResult::new("Custom Query", status, details).with_category(CheckCategory::Custom)
    }
}

impl Validator for CustomQueryValidator {
    fn validate(&self, dataset: &Dataset) -> Vec<ValidationResult> {
        let Some(text) = self.query.as_deref().filter(|q| !q.trim().is_empty()) else {
            return vec![Self::result(CheckStatus::Warning, "No custom query provided")];
        };

        let query = match parse_query(text) {
            Ok(query) => query,
            Err(e) => {
                warn!(dataset = %dataset.id, "custom query rejected: {}", e);
                return vec![Self::result(CheckStatus::Fail, e.to_string())];
            }
        };

        let clause = match query.clause {
            None => {
                return vec![Self::result(
                    CheckStatus::Pass,
                    format!(
                        "Query executed: {} row(s) selected from {}",
                        dataset.row_count(),
                        query.table
                    ),
                )];
            }
            Some(Clause::Unrecognized(raw)) => {
                warn!(dataset = %dataset.id, clause = %raw, "unsupported query clause");
                return vec![Self::result(
                    CheckStatus::Warning,
                    format!(
                        concat!(
                            "Query executed, but the condition '{}' ",
                            "is not supported and was not evaluated"
                        ),
                        raw
                    ),
                )];
            }
            Some(clause) => clause,
        };

        let wanted = clause.column().unwrap_or_default();
        let Some(column) = dataset.headers.iter().find(|h| h.eq_ignore_ascii_case(wanted)) else {
            return vec![Self::result(
                CheckStatus::Fail,
                format!("Column '{}' not found in dataset '{}'", wanted, dataset.id),
            )];
        };

        let rows = clause.matching_rows(dataset, column);
        debug!(
            dataset = %dataset.id,
            clause = %clause,
            matched = rows.len(),
            "custom query evaluated"
        );

        let status = match (clause.flags_problems(), rows.is_empty()) {
            (true, true) | (false, false) => CheckStatus::Pass,
            (true, false) | (false, true) => CheckStatus::Warning,
        };

        vec![Self::result(
            status,
            format!(
                "{} of {} row(s) match WHERE {}",
                rows.len(),
                dataset.row_count(),
                clause
            ),
        )
        .with_column(column.as_str())
        .with_rows(rows)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset() -> Dataset {
        Dataset::from_string_rows(
            "people",
            "people",
            vec!["id".to_string(), "Name".to_string(), "age".to_string()],
            vec![
                vec!["1".to_string(), "Ana".to_string(), "34".to_string()],
                vec!["2".to_string(), "".to_string(), "17".to_string()],
                vec!["3".to_string(), "Andrés".to_string(), "N/A".to_string()],
                vec!["4".to_string(), "Luis".to_string(), "52".to_string()],
            ],
        )
    }

    fn run(query: &str) -> ValidationResult {
        let mut results = CustomQueryValidator::new(Some(query)).validate(&make_dataset());
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    #[test]
    fn test_parse_statement() {
        let query = parse_query("select id, \"Name\" from people where age > 18;").unwrap();
        assert_eq!(query.projection, vec!["id", "Name"]);
        assert_eq!(query.table, "people");
        assert_eq!(
            query.clause,
            Some(Clause::Comparison { column: "age".to_string(), op: CompareOp::Gt, value: 18.0 })
        );

        let query = parse_query("SELECT * FROM t").unwrap();
        assert_eq!(query.projection, vec!["*"]);
        assert!(query.clause.is_none());

        assert!(matches!(parse_query("DELETE FROM t"), Err(DataproofError::UnparseableQuery(_))));
    }

    #[test]
    fn test_parse_clauses() {
        assert_eq!(
            parse_clause("email IS NULL"),
            Clause::NullCheck { column: "email".to_string() }
        );
        assert_eq!(
            parse_clause("(email is not null)"),
            Clause::NotNullCheck { column: "email".to_string() }
        );
        assert_eq!(
            parse_clause("name LIKE 'A%'"),
            Clause::Like { column: "name".to_string(), pattern: "A%".to_string() }
        );
        assert_eq!(
            parse_clause("status IN ('S', 'M')"),
            Clause::InClause {
                column: "status".to_string(),
                values: vec!["S".to_string(), "M".to_string()],
            }
        );
        assert_eq!(
            parse_clause("[age] <> 3"),
            Clause::Comparison { column: "age".to_string(), op: CompareOp::Ne, value: 3.0 }
        );
        assert_eq!(
            parse_clause("city = 'Lima'"),
            Clause::Equality { column: "city".to_string(), value: "Lima".to_string() }
        );
        assert!(matches!(parse_clause("a = 1 AND b = 2"), Clause::Unrecognized(_)));
        assert!(matches!(parse_clause("length(name) > 3"), Clause::Unrecognized(_)));
    }

    #[test]
    fn test_connectives_inside_literals() {
        assert_eq!(
            parse_clause("name = 'Tom and Jerry'"),
            Clause::Equality { column: "name".to_string(), value: "Tom and Jerry".to_string() }
        );
        assert_eq!(
            parse_clause("title LIKE \"%war or peace%\""),
            Clause::Like { column: "title".to_string(), pattern: "%war or peace%".to_string() }
        );
        assert!(matches!(parse_clause("name = 'Tom' AND age > 3"), Clause::Unrecognized(_)));
        assert_eq!(mask_literals("a = 'x or y' OR b"), "a = '______' OR b");

        let r = run("SELECT * FROM people WHERE name = 'Ana or Luis'");
        assert_eq!(r.status, CheckStatus::Warning);
        assert!(r.details.starts_with("0 of 4 row(s) match"), "{}", r.details);
        assert_eq!(r.affected_columns, vec!["Name"]);
    }

    #[test]
    fn test_like_translation() {
        let re = like_to_regex("a_c%.txt").unwrap();
        assert!(re.is_match("abcdef.txt"));
        assert!(re.is_match("ABC.txt"));
        assert!(!re.is_match("abcdefXtxt"));
    }

    #[test]
    fn test_null_check_polarity() {
        let r = run("SELECT * FROM people WHERE name IS NULL");
        assert_eq!(r.status, CheckStatus::Warning);
        assert_eq!(r.affected_rows, vec![1]);
        assert_eq!(r.affected_columns, vec!["Name"]);

        let r = run("SELECT * FROM people WHERE id IS NULL");
        assert_eq!(r.status, CheckStatus::Pass);
        assert!(r.affected_rows.is_empty());
    }

    #[test]
    fn test_expectation_clauses() {
        let r = run("SELECT * FROM people WHERE name LIKE 'an%'");
        assert_eq!(r.status, CheckStatus::Pass);
        assert_eq!(r.affected_rows, vec![0, 2]);

        let r = run("SELECT * FROM people WHERE age >= 18");
        assert_eq!(r.affected_rows, vec![0, 3]);

        let r = run("SELECT * FROM people WHERE id IN (2, '4')");
        assert_eq!(r.affected_rows, vec![1, 3]);

        let r = run("SELECT * FROM people WHERE name = 'Nobody'");
        assert_eq!(r.status, CheckStatus::Warning);
    }

    #[test]
    fn test_degraded_queries() {
        assert_eq!(run("not a query").status, CheckStatus::Fail);
        assert_eq!(run("SELECT * FROM people WHERE missing = 1").status, CheckStatus::Fail);
        assert_eq!(run("SELECT * FROM people WHERE a = 1 OR b = 2").status, CheckStatus::Warning);
        assert_eq!(run("SELECT id FROM people").status, CheckStatus::Pass);

        let results = CustomQueryValidator::new(None).validate(&make_dataset());
        assert_eq!(results[0].status, CheckStatus::Warning);
    }
}
