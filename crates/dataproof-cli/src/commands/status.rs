//! Status command - list stored datasets and their validation status.

use std::path::PathBuf;

use colored::Colorize;

use super::{open_store, paint_dataset};

pub fn run(store: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !store.is_dir() {
        return Err(format!(
            "Store not found: {}\nRun 'dataproof validate <FILE> --store {}' first.",
            store.display(),
            store.display()
        )
        .into());
    }

    let service = open_store(&store)?;
    let summaries = service.summaries()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Datasets in".cyan().bold(),
        store.display().to_string().white()
    );
    println!();

    if summaries.is_empty() {
        println!("  {}", "No datasets stored.".dimmed());
        return Ok(());
    }

    for summary in &summaries {
        let runs = service.history(&summary.id)?.len();
        println!(
            "  {} {}",
            summary.name.white().bold(),
            format!("({})", summary.id).dimmed()
        );
        println!(
            "    {} · {} rows × {} columns · {} · {} run(s) · {}",
            summary.kind,
            summary.row_count,
            summary.column_count,
            summary.size,
            runs,
            paint_dataset(summary.status)
        );
    }

    let issues = summaries
        .iter()
        .filter(|s| s.status == dataproof::DatasetStatus::IssuesFound)
        .count();
    println!();
    println!(
        "{} dataset(s), {} with issues",
        summaries.len(),
        if issues == 0 { issues.to_string().green() } else { issues.to_string().yellow() }
    );

    Ok(())
}
