//! Loads dataset files into [`Dataset`]s.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dataset::{Dataset, DatasetMetadata, DatasetSource};
use crate::error::{DataproofError, Result};

use super::delimited::{detect_delimiter, format_name, parse_delimited};
use super::json::parse_json;

/// File layouts the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Json,
}

impl InputFormat {
    /// Choose a format from a file extension. Files without an extension are
    /// read as delimited text.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            None | Some("csv" | "tsv" | "tab" | "txt" | "psv") => Ok(InputFormat::Delimited),
            Some(other) => Err(DataproofError::UnsupportedFormat(format!(
                "'.{}' files are not supported ({})",
                other,
                path.display()
            ))),
        }
    }
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether delimited files start with a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Reads CSV/TSV/JSON files into datasets.
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a new loader with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a file. The dataset id derives from the file name, and the
    /// source metadata records the format and a SHA-256 of the contents.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let format = InputFormat::from_path(path)?;

        let mut file = File::open(path).map_err(|e| DataproofError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| DataproofError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset")
            .to_string();
        let stem = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset");

        let (dataset, format_label) = self.load_bytes(&dataset_id(stem), stem, &contents, format)?;

        debug!(
            path = %path.display(),
            format = format_label,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "dataset loaded"
        );

        Ok(dataset.with_metadata(DatasetMetadata::new(DatasetSource::File {
            file: file_name,
            format: format_label.to_string(),
            hash: content_hash(&contents),
        })))
    }

    /// Parse in-memory contents. Returns the dataset and the detected
    /// format name (`csv`, `tsv`, `json`, ...). JSON documents carrying their
    /// own `id`/`name` keep them.
    pub fn load_bytes(
        &self,
        id: &str,
        name: &str,
        contents: &[u8],
        format: InputFormat,
    ) -> Result<(Dataset, &'static str)> {
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Err(DataproofError::EmptyData(format!("'{}' is empty", name)));
        }

        match format {
            InputFormat::Delimited => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(contents)?,
                };
                let table = parse_delimited(
                    contents,
                    delimiter,
                    self.config.has_header,
                    self.config.quote,
                    self.config.max_rows,
                )?;
                Ok((
                    Dataset::from_string_rows(id, name, table.headers, table.rows),
                    format_name(delimiter),
                ))
            }
            InputFormat::Json => {
                let mut table = parse_json(contents)?;
                if let Some(max) = self.config.max_rows {
                    table.rows.truncate(max);
                }
                let dataset = Dataset::new(
                    table.id.unwrap_or_else(|| id.to_string()),
                    table.name.unwrap_or_else(|| name.to_string()),
                    table.headers,
                    table.rows,
                );
                Ok((dataset, "json"))
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// `sha256:<hex>` digest of file contents.
pub fn content_hash(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("sha256:{:x}", hasher.finalize())
}

/// Lower-case id built from a file stem: runs of other characters become `_`.
pub fn dataset_id(stem: &str) -> String {
    let mut id = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }
    let id = id.trim_matches('_').to_string();
    if id.is_empty() { "dataset".to_string() } else { id }
}
