//! Dataset ingestion from CSV/TSV/JSON files.

mod delimited;
mod json;
mod loader;

pub use delimited::{detect_delimiter, format_name, parse_delimited, DelimitedTable};
pub use json::{parse_json, JsonTable};
pub use loader::{content_hash, dataset_id, InputFormat, Loader, LoaderConfig};
