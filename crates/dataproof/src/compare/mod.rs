//! Dataset comparison: key alignment, cell diffs, and missing-row detection.

mod comparator;
mod result;

pub use comparator::{compare, Comparator};
pub use result::{
    CellDifference, ColumnComparison, ComparisonResult, ComparisonSummary, MissingRow, RowLocation,
};
