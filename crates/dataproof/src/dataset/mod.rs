//! In-memory tabular datasets consumed by the comparison and validation engines.

mod metadata;
mod table;

pub use metadata::{DatasetMetadata, DatasetSource};
pub use table::{cell_text, is_empty_cell, Dataset, Row};
