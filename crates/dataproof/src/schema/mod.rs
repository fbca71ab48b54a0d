//! Column type classification.

mod inference;
mod types;

pub use inference::{
    infer_column_type, looks_like_date, parse_number, profile_column, TypeMismatch, TypeProfile,
};
pub use types::ColumnType;
