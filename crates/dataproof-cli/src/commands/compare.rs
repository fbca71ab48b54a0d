//! Compare command - diff two data files row by row.

use std::path::PathBuf;

use colored::Colorize;
use dataproof::{
    Comparator, Dataset, Loader, QualityService, RowLocation, Store, StoredComparison,
    ValidationBatch,
};

use super::open_store;

pub fn run(
    source: PathBuf,
    target: PathBuf,
    key: Option<String>,
    limit: usize,
    store: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loader = Loader::new();
    let source_ds = loader.load_file(&source)?;
    let mut target_ds = loader.load_file(&target)?;
    if target_ds.id == source_ds.id {
        target_ds.id = format!("{}_target", target_ds.id);
    }

    let comparator = match key {
        Some(column) => Comparator::new().with_key_column(column),
        None => Comparator::new(),
    };

    let stored = match &store {
        Some(dir) => compare_in(
            &mut open_store(dir)?.with_comparator(comparator),
            &source_ds,
            &target_ds,
        )?,
        None => compare_in(
            &mut QualityService::in_memory().with_comparator(comparator),
            &source_ds,
            &target_ds,
        )?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    let result = &stored.result;
    let summary = &result.summary;

    println!(
        "{} {} {} {}",
        "Comparing".cyan().bold(),
        source.display().to_string().white(),
        "→".dimmed(),
        target.display().to_string().white()
    );
    println!();

    println!("{}", "Summary:".yellow().bold());
    println!("  Rows analyzed:        {}", summary.rows_analyzed);
    println!("  Rows matched:         {}", summary.rows_matched);
    println!("  Rows different:       {}", count(summary.rows_different));
    println!("  Missing from source:  {}", count(summary.rows_missing_source));
    println!("  Missing from target:  {}", count(summary.rows_missing_target));
    println!(
        "  Columns compared:     {} ({} different)",
        summary.columns_compared, summary.columns_different
    );
    println!("  Execution time:       {}", summary.execution_time);
    println!();

    println!("{}", "Columns:".yellow().bold());
    for column in &result.columns {
        let mark = if column.matches { "✓".green() } else { "✗".red() };
        println!(
            "  {} {} {} {}",
            mark,
            column.name,
            format!("[{}]", column.column_type).dimmed(),
            if column.matches {
                String::new()
            } else {
                format!("{} difference(s)", column.differences)
            }
        );
    }

    if !result.differences.is_empty() {
        println!();
        println!("{}", "Differences:".yellow().bold());
        for diff in result.differences.iter().take(limit) {
            println!(
                "  key {} {}: {} → {}",
                diff.key.white().bold(),
                diff.column,
                diff.source_value.to_string().red(),
                diff.target_value.to_string().green()
            );
        }
        more(result.differences.len(), limit);
    }

    if !result.missing.is_empty() {
        println!();
        println!("{}", "Missing rows:".yellow().bold());
        for row in result.missing.iter().take(limit) {
            let side = match row.location {
                RowLocation::Source => "only in target".blue(),
                RowLocation::Target => "only in source".magenta(),
            };
            println!("  key {} {}", row.key.white().bold(), side);
        }
        more(result.missing.len(), limit);
    }

    println!();
    if result.is_identical() {
        println!("{}", "Datasets are identical.".green().bold());
    }
    if store.is_some() {
        println!("{}", format!("Saved as {}", stored.id).dimmed());
    }

    Ok(())
}

fn count(n: usize) -> colored::ColoredString {
    if n == 0 {
        n.to_string().green()
    } else {
        n.to_string().yellow()
    }
}

fn more(total: usize, limit: usize) {
    if total > limit {
        println!("  {}", format!("... and {} more", total - limit).dimmed());
    }
}

fn compare_in<D, H, C>(
    service: &mut QualityService<D, H, C>,
    source: &Dataset,
    target: &Dataset,
) -> dataproof::Result<StoredComparison>
where
    D: Store<Dataset>,
    H: Store<Vec<ValidationBatch>>,
    C: Store<StoredComparison>,
{
    service.add_dataset(source)?;
    service.add_dataset(target)?;
    service.compare(&source.id, &target.id)
}
