//! Error types for the dataproof library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dataproof operations.
#[derive(Debug, Error)]
pub enum DataproofError {
    /// A dataset id could not be resolved.
    #[error("Dataset '{id}' not found")]
    DatasetNotFound { id: String },

    /// A dataset passed to a comparison has no rows.
    #[error("Dataset '{dataset_id}' has no rows to compare")]
    EmptyContent { dataset_id: String },

    /// Validation was requested on a dataset without parsed content.
    #[error("Dataset '{dataset_id}' has no parsed content to validate")]
    DatasetHasNoContent { dataset_id: String },

    /// A custom query matched none of the supported grammar rules.
    #[error("Unparseable query: {0}")]
    UnparseableQuery(String),

    /// A validation method name outside the known set.
    #[error("Unknown validation method: {0}")]
    UnknownMethod(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Saving or loading persisted state failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for dataproof operations.
pub type Result<T> = std::result::Result<T, DataproofError>;
