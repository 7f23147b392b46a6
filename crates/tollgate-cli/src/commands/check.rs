//! Check command - validate a data file against its rules.

use std::path::PathBuf;

use super::{print_report, Context};

/// Returns `Ok(false)` when the dataset fails its checks.
pub fn run(
    ctx: &Context,
    name: String,
    file: PathBuf,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let gate = ctx.gate()?;
    let dataset = gate.load(&file)?;
    let report = gate.check(&dataset, &name)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, ctx.verbose);
    }

    Ok(report.passed())
}
