//! Property-based tests for the comparator and the validation engine.
//!
//! Properties covered:
//! 1. **Determinism**: comparing unchanged inputs twice gives the same diff
//! 2. **Symmetry**: rows missing on one side mirror when arguments swap
//! 3. **Accounting**: summary counts agree with the detailed lists
//! 4. **Monotonicity**: more empty cells never lower the missing count, and
//!    a Fail always turns a clean batch into `Issues Found`
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p dataproof --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use dataproof::validation::MissingValuesValidator;
use dataproof::validation::Validator;
use dataproof::{
    compare, derive_status, CheckStatus, Dataset, DatasetStatus, RowLocation, ValidationEngine,
    ValidationMethod, ValidationResult,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Cell values drawn from a small alphabet so keys and values collide often.
fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-c]{1,2}",
        2 => "[0-9]{1,3}",
        1 => Just(String::new()),
    ]
}

/// Headers: a random subset of a fixed pool, always including `id`.
fn headers() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(vec!["name", "city", "score", "email", "note"], 0..=5).prop_map(
        |extra| {
            std::iter::once("id")
                .chain(extra)
                .map(String::from)
                .collect()
        },
    )
}

fn dataset(id: &'static str) -> impl Strategy<Value = Dataset> {
    (headers(), 1usize..12).prop_flat_map(move |(headers, rows)| {
        let width = headers.len();
        proptest::collection::vec(proptest::collection::vec(cell(), width), rows).prop_map(
            move |mut rows| {
                for (i, row) in rows.iter_mut().enumerate() {
                    // Keys from a narrow range, so the two sides partly overlap.
                    row[0] = (i % 7 + (i * 3) % 5).to_string();
                }
                Dataset::from_string_rows(id, id, headers.clone(), rows)
            },
        )
    })
}

fn status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Pass),
        Just(CheckStatus::Info),
        Just(CheckStatus::Warning),
        Just(CheckStatus::Fail),
    ]
}

// =============================================================================
// Comparator Properties
// =============================================================================

proptest! {
    #[test]
    fn compare_is_deterministic(a in dataset("a"), b in dataset("b")) {
        let first = compare(&a, &b).unwrap();
        let second = compare(&a, &b).unwrap();

        prop_assert_eq!(&first.columns, &second.columns);
        prop_assert_eq!(&first.differences, &second.differences);
        prop_assert_eq!(&first.missing, &second.missing);
        prop_assert_eq!(first.summary.rows_matched, second.summary.rows_matched);
        prop_assert_eq!(first.summary.rows_different, second.summary.rows_different);
    }

    #[test]
    fn missing_rows_are_symmetric(a in dataset("a"), b in dataset("b")) {
        let forward = compare(&a, &b).unwrap();
        let backward = compare(&b, &a).unwrap();

        prop_assert_eq!(
            forward.missing_in(RowLocation::Source).count(),
            backward.missing_in(RowLocation::Target).count()
        );
        prop_assert_eq!(
            forward.missing_in(RowLocation::Target).count(),
            backward.missing_in(RowLocation::Source).count()
        );
    }

    #[test]
    fn summary_accounts_for_every_missing_row(a in dataset("a"), b in dataset("b")) {
        let result = compare(&a, &b).unwrap();
        let summary = &result.summary;

        prop_assert_eq!(
            summary.rows_missing_source + summary.rows_missing_target,
            result.missing.len()
        );
        prop_assert_eq!(summary.rows_analyzed, a.row_count() + b.row_count());
        prop_assert_eq!(
            summary.rows_matched,
            summary.rows_analyzed as i64
                - result.missing.len() as i64
                - result.differences.len() as i64
        );

        let keys: HashSet<&str> = result.differences.iter().map(|d| d.key.as_str()).collect();
        prop_assert_eq!(summary.rows_different, keys.len());
    }

    #[test]
    fn every_header_gets_a_column_result(a in dataset("a"), b in dataset("b")) {
        let result = compare(&a, &b).unwrap();
        let union: HashSet<&String> = a.headers.iter().chain(b.headers.iter()).collect();

        prop_assert_eq!(result.columns.len(), union.len());
        prop_assert_eq!(
            result.summary.columns_different,
            result.columns.iter().filter(|c| !c.matches).count()
        );
    }

    #[test]
    fn self_comparison_without_duplicate_keys_is_identical(a in dataset("a")) {
        let keys: HashSet<String> = a.rows.iter().map(|r| r["id"].to_string()).collect();
        prop_assume!(keys.len() == a.row_count());

        prop_assert!(compare(&a, &a).unwrap().is_identical());
    }
}

// =============================================================================
// Validation Properties
// =============================================================================

fn missing_count(dataset: &Dataset) -> usize {
    dataset
        .headers
        .iter()
        .map(|h| dataset.column_values(h).filter(|v| dataproof::dataset::is_empty_cell(*v)).count())
        .sum()
}

proptest! {
    #[test]
    fn blanking_cells_never_lowers_missing_values(
        a in dataset("a"),
        column in 0usize..6,
        row in 0usize..12
    ) {
        let column = &a.headers[column % a.headers.len()];
        let row = row % a.row_count();

        let mut blanked = a.clone();
        blanked.rows[row].insert(column.clone(), serde_json::Value::String(String::new()));

        prop_assert!(missing_count(&blanked) >= missing_count(&a));

        let validator = MissingValuesValidator::default();
        let before = validator.validate(&a)[0].status;
        let after = validator.validate(&blanked)[0].status;
        prop_assert!(after.severity() >= before.severity());
    }

    #[test]
    fn validation_never_fails_on_content(
        a in dataset("a"),
        method in proptest::sample::select(ValidationMethod::ALL.to_vec())
    ) {
        let results = ValidationEngine::new()
            .run(&a, method, Some("SELECT * FROM a WHERE score > 10"))
            .unwrap();

        prop_assert!(!results.is_empty());
        for (index, result) in results.iter().enumerate() {
            let suffix = format!("_{}", index);
            prop_assert!(result.id.ends_with(&suffix));
            prop_assert_eq!(&result.dataset_id, "a");
        }
    }

    #[test]
    fn a_fail_always_means_issues_found(statuses in proptest::collection::vec(status(), 0..10)) {
        let batch: Vec<ValidationResult> = statuses
            .iter()
            .map(|s| ValidationResult::new("check", *s, "details"))
            .collect();

        let clean: Vec<ValidationResult> = batch
            .iter()
            .filter(|r| !r.status.is_issue())
            .cloned()
            .collect();
        if clean.is_empty() {
            prop_assert_eq!(derive_status(&clean), DatasetStatus::NotValidated);
        } else {
            prop_assert_eq!(derive_status(&clean), DatasetStatus::Validated);
        }

        let mut failed = batch.clone();
        failed.push(ValidationResult::new("check", CheckStatus::Fail, "details"));
        prop_assert_eq!(derive_status(&failed), DatasetStatus::IssuesFound);
    }
}
