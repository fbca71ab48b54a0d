//! Validation engine: quality checks, result types and status derivation.

mod checks;
mod engine;
mod format;
mod query;
mod result;
mod statistics;
mod text;

pub use checks::{
    AnomalyValidator, ColumnCompletenessValidator, DuplicateRowValidator, MissingValuesValidator,
    RowCountValidator, TypeConsistencyValidator, Validator,
};
pub use engine::{ValidationEngine, ValidationMethod};
pub use format::{FormatChecksValidator, ValueLookupValidator};
pub use query::{parse_clause, parse_query, Clause, CompareOp, CustomQueryValidator, Query};
pub use result::{
    derive_status, worst_status, CheckCategory, CheckStatus, DatasetStatus, ValidationResult,
};
pub use statistics::{
    coefficient_of_variation, histogram, numeric_column, pearson, NumericSummary,
    StatisticalValidator,
};
pub use text::{
    classify_casing, detect_format, text_column, Casing, FormatProfile, TextFormat,
    TextPatternValidator,
};
