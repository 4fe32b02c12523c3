//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Scry - Automated insight discovery for tabular data
#[derive(Parser)]
#[command(name = "scry")]
#[command(about = "Find the interesting group-bys in a dataset before you ask", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the fields of a dataset
    Fields {
        /// CSV file to inspect
        #[arg(short, long)]
        file: PathBuf,

        /// Force these fields to be dimensions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        dimensions: Option<Vec<String>>,

        /// Force these fields to be measures (comma-separated)
        #[arg(long, value_delimiter = ',')]
        measures: Option<Vec<String>>,

        /// Emit the catalog as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run the full discovery pipeline and print ranked insights
    Analyze {
        /// CSV file to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Force these fields to be the dimensions (comma-separated)
        #[arg(long, value_delimiter = ',')]
        dimensions: Option<Vec<String>>,

        /// Force these fields to be the measures (comma-separated)
        #[arg(long, value_delimiter = ',')]
        measures: Option<Vec<String>>,

        /// Largest dimension-set per view-space
        #[arg(long, default_value = "3")]
        max_dimensions: usize,

        /// Largest measure-set per view-space
        #[arg(long, default_value = "3")]
        max_measures: usize,

        /// Weakest association that may fuse two field clusters
        #[arg(long, default_value = "0.3")]
        threshold: f64,

        /// Per-measure aggregator, e.g. --agg revenue=mean (repeatable)
        #[arg(long = "agg")]
        aggregators: Vec<String>,

        /// How many ranked insights to print
        #[arg(long, default_value = "20")]
        top: usize,

        /// Emit the ranked insights as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
