//! Tollgate CLI - quality gate and lineage tracker.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

/// Exit code for a dataset that failed its checks.
const EXIT_FAILED_CHECK: i32 = 2;

fn main() {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "warn" });

    let ctx = commands::Context {
        log_dir: cli.log_dir,
        rules: cli.rules,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Check { name, file, json } => commands::check::run(&ctx, name, file, json),

        Commands::Track { name, stage, file } => {
            commands::track::run(&ctx, name, stage, file).map(|_| true)
        }

        Commands::Ingest { name, file, stage } => commands::ingest::run(&ctx, name, file, stage),

        Commands::Transform {
            source,
            target,
            transformation_type,
            details,
        } => commands::transform::run(&ctx, source, target, transformation_type, details)
            .map(|_| true),

        Commands::Lineage { name, json } => commands::lineage::run(&ctx, name, json).map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FAILED_CHECK),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
