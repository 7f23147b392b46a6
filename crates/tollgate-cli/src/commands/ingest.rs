//! Ingest command - check a data file and track it if it passes.

use std::path::PathBuf;

use colored::Colorize;
use tollgate::IngestOutcome;

use super::{print_report, Context};

/// Returns `Ok(false)` when the dataset was rejected.
pub fn run(
    ctx: &Context,
    name: String,
    file: PathBuf,
    stage: String,
) -> Result<bool, Box<dyn std::error::Error>> {
    let gate = ctx.gate()?;
    let dataset = gate.load(&file)?;
    let outcome = gate.ingest(&dataset, &name, &stage)?;

    print_report(outcome.report(), ctx.verbose);
    println!();
    match &outcome {
        IngestOutcome::Accepted { snapshot, .. } => {
            println!(
                "{} {} at stage {} ({})",
                "Tracked".green().bold(),
                name,
                stage.cyan(),
                snapshot.fingerprint
            );
        }
        IngestOutcome::Rejected { .. } => {
            println!(
                "{} {} was not tracked",
                "Halted:".red().bold(),
                name
            );
        }
    }

    Ok(outcome.is_accepted())
}
