//! Dataproof CLI - dataset comparison and validation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare {
            source,
            target,
            key,
            limit,
            store,
            json,
        } => commands::compare::run(source, target, key, limit, store, json),

        Commands::Validate {
            file,
            method,
            query,
            config,
            store,
            json,
        } => commands::validate::run(file, method, query, config, store, json, cli.verbose),

        Commands::Status { store, json } => commands::status::run(store, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
