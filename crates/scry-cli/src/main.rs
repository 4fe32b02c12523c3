//! Scry CLI - Automated insight discovery for tabular data
//!
//! Usage:
//!   scry fields --file data.csv      Classify fields into dimensions/measures
//!   scry analyze --file data.csv     Run the discovery pipeline, print ranked insights

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Fields {
            file,
            dimensions,
            measures,
            json,
        } => commands::cmd_fields(&file, dimensions.as_deref(), measures.as_deref(), json),
        Commands::Analyze {
            file,
            dimensions,
            measures,
            max_dimensions,
            max_measures,
            threshold,
            aggregators,
            top,
            json,
        } => commands::cmd_analyze(
            &file,
            dimensions.as_deref(),
            measures.as_deref(),
            max_dimensions,
            max_measures,
            threshold,
            &aggregators,
            top,
            json,
        ),
    }
}
