//! Validate command - run a validation method against a data file.

use std::path::PathBuf;

use colored::Colorize;
use dataproof::service::ValidationOutcome;
use dataproof::{Dataset, Loader, QualityService, Store, StoredComparison, ValidationBatch};

use super::{load_engine, open_store, paint_check, paint_dataset};

pub fn run(
    file: PathBuf,
    method: String,
    query: Option<String>,
    config: Option<PathBuf>,
    store: Option<PathBuf>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = load_engine(config.as_deref())?;
    let dataset = Loader::new().load_file(&file)?;

    let outcome = match &store {
        Some(dir) => {
            let mut service = open_store(dir)?.with_engine(engine);
            validate_in(&mut service, &dataset, &method, query.as_deref())?
        }
        None => {
            let mut service = QualityService::in_memory().with_engine(engine);
            validate_in(&mut service, &dataset, &method, query.as_deref())?
        }
    };

    if json_output {
        let report = serde_json::json!({
            "dataset": dataset.id,
            "method": method,
            "status": outcome.status,
            "results": outcome.results,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Validating".cyan().bold(),
        dataset.name.white().bold(),
        format!(
            "({} rows × {} columns, method: {})",
            dataset.row_count(),
            dataset.column_count(),
            method
        )
        .dimmed()
    );
    println!();

    for result in &outcome.results {
        println!("  {:<8} {}", paint_check(result.status), result.check.bold());
        println!("           {}", result.details);
        if verbose && !result.affected_rows.is_empty() {
            let rows: Vec<String> = result
                .affected_rows
                .iter()
                .take(20)
                .map(|r| r.to_string())
                .collect();
            let more = result.affected_rows.len().saturating_sub(rows.len());
            println!(
                "           {} {}{}",
                "rows:".dimmed(),
                rows.join(", "),
                if more > 0 { format!(" (+{} more)", more) } else { String::new() }
            );
        }
    }
    println!();

    let issues = outcome.results.iter().filter(|r| r.status.is_issue()).count();
    println!(
        "Status: {} ({} check(s), {} issue(s))",
        paint_dataset(outcome.status).bold(),
        outcome.results.len(),
        issues
    );
    if let Some(dir) = store {
        println!("{}", format!("History saved to {}", dir.display()).dimmed());
    }

    Ok(())
}

fn validate_in<D, H, C>(
    service: &mut QualityService<D, H, C>,
    dataset: &Dataset,
    method: &str,
    query: Option<&str>,
) -> dataproof::Result<ValidationOutcome>
where
    D: Store<Dataset>,
    H: Store<Vec<ValidationBatch>>,
    C: Store<StoredComparison>,
{
    service.add_dataset(dataset)?;
    service.validate(&dataset.id, method, query)
}
