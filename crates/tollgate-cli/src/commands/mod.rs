//! CLI command implementations.

pub mod check;
pub mod ingest;
pub mod lineage;
pub mod track;
pub mod transform;

use std::path::PathBuf;

use colored::Colorize;
use tollgate::{QualityReport, RuleRegistry, Tollgate, TollgateConfig};

/// Options shared by every command.
pub struct Context {
    pub log_dir: PathBuf,
    pub rules: Option<PathBuf>,
    pub verbose: bool,
}

impl Context {
    /// Build a gate over the configured rules and log directory.
    pub fn gate(&self) -> Result<Tollgate, Box<dyn std::error::Error>> {
        let registry = match &self.rules {
            Some(path) => RuleRegistry::from_json_file(path)?,
            None => RuleRegistry::ecommerce_defaults(),
        };
        let config = TollgateConfig::default().with_log_dir(&self.log_dir);
        Ok(Tollgate::with_config(registry, config))
    }
}

/// Human-readable rendering of a report.
pub fn print_report(report: &QualityReport, verbose: bool) {
    let verdict = if report.passed() {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "{} {} ({} rows) {}",
        "Quality check for".cyan().bold(),
        report.dataset_name().white(),
        report.total_rows(),
        verdict
    );

    if !report.issues().is_empty() {
        println!();
        println!("{}", "Issues:".yellow().bold());
        for issue in report.issues() {
            println!("  {} {}", format!("[{}]", issue.kind.label()).red(), issue);
        }
    }

    if verbose {
        let summary = report.summary();
        println!();
        println!("{}", "Columns:".yellow().bold());
        for (column, nulls) in &summary.null_counts {
            let unique = summary.unique_counts.get(column).copied().unwrap_or(0);
            println!("  {:<30} nulls: {:<8} unique: {}", column, nulls, unique);
        }
        for (column, stats) in &summary.numeric_columns_stats {
            println!(
                "  {:<30} mean: {} min: {} max: {}",
                column,
                fmt_stat(stats.mean),
                fmt_stat(stats.min),
                fmt_stat(stats.max)
            );
        }
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
