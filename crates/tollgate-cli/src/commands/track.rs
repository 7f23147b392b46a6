//! Track command - record a metadata snapshot and lineage record.

use std::path::PathBuf;

use colored::Colorize;

use super::Context;

pub fn run(
    ctx: &Context,
    name: String,
    stage: String,
    file: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let gate = ctx.gate()?;
    let dataset = gate.load(&file)?;
    let snapshot = gate.track(&dataset, &name, &stage)?;

    println!(
        "{} {} at stage {}",
        "Tracked".green().bold(),
        name.white(),
        stage.cyan()
    );
    println!("  Rows:        {}", snapshot.row_count);
    println!("  Columns:     {}", snapshot.columns.len());
    println!("  Fingerprint: {}", snapshot.fingerprint);
    if ctx.verbose {
        println!("  Content:     {}", snapshot.content_hash);
        for (column, dtype) in &snapshot.dtypes {
            println!("    {:<30} {}", column, dtype);
        }
    }

    Ok(())
}
