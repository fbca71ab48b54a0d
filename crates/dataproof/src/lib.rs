//! Dataproof: dataset comparison and validation engine for tabular data.
//!
//! Two engines work over in-memory datasets (ordered headers plus row
//! records):
//!
//! - The **comparator** aligns two datasets on a key column and reports cell
//!   differences, rows missing on either side and summary counts.
//! - The **validation engine** runs a named bundle of quality checks
//!   (completeness, type consistency, duplicates, statistics, text patterns,
//!   format rules, custom queries) and returns severity-tagged results from
//!   which a dataset status is derived.
//!
//! Both engines are synchronous and never mutate their input. Persistence and
//! id resolution live in [`service::QualityService`] over pluggable
//! [`store::Store`]s.
//!
//! # Example
//!
//! ```
//! use dataproof::{compare, derive_status, Dataset, DatasetStatus, ValidationEngine};
//!
//! let source = Dataset::from_string_rows(
//!     "src", "customers", vec!["id".into(), "email".into()],
//!     vec![vec!["1".into(), "a@x.com".into()]],
//! );
//! let target = Dataset::from_string_rows(
//!     "tgt", "customers", vec!["id".into(), "email".into()],
//!     vec![vec!["1".into(), "b@x.com".into()]],
//! );
//!
//! let diff = compare(&source, &target).unwrap();
//! assert_eq!(diff.summary.rows_different, 1);
//!
//! let results = ValidationEngine::new().validate(&source, "basic", None).unwrap();
//! assert_eq!(derive_status(&results), DatasetStatus::Validated);
//! ```

pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod schema;
pub mod service;
pub mod store;
pub mod validation;

pub use compare::{compare, Comparator, ComparisonResult, ComparisonSummary, RowLocation};
pub use config::EngineConfig;
pub use dataset::{Dataset, DatasetMetadata, DatasetSource, Row};
pub use error::{DataproofError, Result};
pub use input::Loader;
pub use schema::ColumnType;
pub use service::{
    DatasetSummary, QualityService, StoredComparison, ValidationBatch, ValidationOutcome,
};
pub use store::{JsonFileStore, MemoryStore, Store};
pub use validation::{
    derive_status, CheckCategory, CheckStatus, DatasetStatus, ValidationEngine, ValidationMethod,
    ValidationResult,
};
