//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default directory for persisted datasets, history and comparisons.
pub const DEFAULT_STORE: &str = ".dataproof";

/// Dataproof: compare and validate tabular datasets
#[derive(Parser)]
#[command(name = "dataproof")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two data files row by row
    Compare {
        /// Source data file (CSV/TSV/JSON)
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Target data file (CSV/TSV/JSON)
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Column to align rows on (default: `id`, else the first header)
        #[arg(short, long)]
        key: Option<String>,

        /// Maximum differences and missing rows to print
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Persist datasets and the comparison in this directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a validation method against a data file
    Validate {
        /// Data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Validation method: basic, advanced, custom, format_checks,
        /// value_lookup, data_completeness, data_quality,
        /// statistical_analysis, text_analysis
        #[arg(short, long, default_value = "basic")]
        method: String,

        /// Query for the custom method, e.g. "SELECT * FROM t WHERE email IS NULL"
        #[arg(short, long)]
        query: Option<String>,

        /// Engine thresholds as a JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Persist the dataset and validation history in this directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored datasets with their validation status
    Status {
        /// Store directory
        #[arg(long, default_value = DEFAULT_STORE)]
        store: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
