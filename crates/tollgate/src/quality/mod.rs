//! Rule checks and quality reports.

mod checker;
pub mod checks;
mod report;
pub mod stats;

pub use checker::QualityChecker;
pub use checks::Check;
pub use report::{Issue, IssueKind, NumericSummary, QualityReport, ReportSummary};
