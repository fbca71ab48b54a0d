//! Provenance metadata attached to a dataset by the ingesting collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a dataset's rows came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatasetSource {
    /// Uploaded file.
    File {
        /// File name without path.
        file: String,
        /// Detected format (csv, tsv, json, ...).
        format: String,
        /// SHA-256 of the file contents.
        hash: String,
    },
    /// Imported database table.
    Database {
        #[serde(rename = "connectionName")]
        connection_name: String,
        #[serde(rename = "tableName")]
        table_name: String,
    },
    /// Built in memory by the caller.
    Inline,
}

impl DatasetSource {
    /// Label shown in dataset listings.
    pub fn kind_label(&self) -> &'static str {
        match self {
            DatasetSource::File { .. } => "File",
            DatasetSource::Database { .. } => "Database",
            DatasetSource::Inline => "Inline",
        }
    }
}

/// Metadata about a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub source: DatasetSource,
    pub date_uploaded: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl DatasetMetadata {
    /// Metadata for a dataset ingested now.
    pub fn new(source: DatasetSource) -> Self {
        let now = Utc::now();
        Self {
            source,
            date_uploaded: now,
            last_updated: now,
        }
    }
}
