//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tollgate: quality gate and lineage tracker for tabular datasets
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for reports, snapshots and lineage
    #[arg(long, global = true, value_name = "DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// JSON rules file (default: built-in e-commerce rules)
    #[arg(long, global = true, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a data file against the rules for a dataset
    Check {
        /// Dataset name the rules are registered under
        #[arg(value_name = "NAME")]
        name: String,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a metadata snapshot and lineage record for a data file
    Track {
        /// Dataset name
        #[arg(value_name = "NAME")]
        name: String,

        /// Processing stage (e.g. raw, cleaned, merged)
        #[arg(value_name = "STAGE")]
        stage: String,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check a data file and track it only if it passes
    Ingest {
        /// Dataset name the rules are registered under
        #[arg(value_name = "NAME")]
        name: String,

        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Stage to track the dataset at
        #[arg(long, default_value = "raw")]
        stage: String,
    },

    /// Log that TARGET was derived from SOURCE
    Transform {
        /// Source dataset(s), comma-separated
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Target dataset
        #[arg(value_name = "TARGET")]
        target: String,

        /// Kind of transformation (e.g. merge, filter)
        #[arg(value_name = "TYPE")]
        transformation_type: String,

        /// Transformation detail as key=value (repeatable)
        #[arg(short, long = "detail", value_name = "KEY=VALUE")]
        details: Vec<String>,
    },

    /// Show recorded stages and incoming transformations of a dataset
    Lineage {
        /// Dataset name
        #[arg(value_name = "NAME")]
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
