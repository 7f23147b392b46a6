//! Lineage command - show what is recorded about a dataset.

use colored::Colorize;

use super::Context;

pub fn run(ctx: &Context, name: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let gate = ctx.gate()?;
    let view = gate.lineage_of(&name)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{} {}", "Lineage of".cyan().bold(), name.white());
    println!();

    if view.stages.is_empty() {
        println!("{}", "No stages recorded.".dimmed());
    } else {
        println!("{}", "Stages:".yellow().bold());
        for record in &view.stages {
            println!(
                "  {}  {:<12} rows: {:<8} {}",
                record.timestamp,
                record.stage,
                record.row_count,
                short(record.fingerprint.as_str()).dimmed()
            );
        }
    }

    println!();
    if view.incoming.is_empty() {
        println!("{}", "No incoming transformations.".dimmed());
    } else {
        println!("{}", "Derived from:".yellow().bold());
        for entry in &view.incoming {
            println!(
                "  {}  {} {} ({})",
                entry.timestamp,
                entry.source_dataset.white(),
                "->".cyan(),
                entry.transformation_type
            );
            if ctx.verbose {
                for (key, value) in &entry.transformation_details {
                    println!("      {} = {}", key, value);
                }
            }
        }
        println!();
        println!("Upstream: {}", view.upstream().join(", "));
    }

    Ok(())
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
