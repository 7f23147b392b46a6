//! Tollgate: rule-driven quality gate and lineage tracker for tabular datasets.
//!
//! Tollgate checks datasets against declarative, per-dataset rule sets before
//! they move further down a pipeline, and records what each dataset looked
//! like at every stage and which datasets it was derived from.
//!
//! # Core Principles
//!
//! - **Issues are data**: a failing dataset yields a report, not an error
//! - **Non-destructive**: the caller's dataset is never modified
//! - **Append-only provenance**: snapshots never overwrite each other
//!
//! # Example
//!
//! ```no_run
//! use tollgate::{RuleRegistry, Tollgate};
//!
//! let gate = Tollgate::new(RuleRegistry::ecommerce_defaults());
//! let orders = gate.load("orders.csv").unwrap();
//!
//! let report = gate.check(&orders, "orders").unwrap();
//! if report.passed() {
//!     gate.track(&orders, "orders", "raw").unwrap();
//! } else {
//!     for issue in report.issues() {
//!         println!("{}", issue);
//!     }
//! }
//! ```

pub mod error;
pub mod governance;
pub mod input;
pub mod quality;
pub mod rules;
pub mod store;

mod tollgate;

pub use crate::tollgate::{IngestOutcome, Tollgate, TollgateConfig};
pub use error::{Result, TollgateError};
pub use governance::{
    Fingerprint, Fingerprinter, LineageRecord, LineageTracker, LineageView, MetadataRecorder,
    MetadataSnapshot, TransformationLogEntry,
};
pub use input::{Column, ColumnType, Dataset, Parser, ParserConfig, Value};
pub use quality::{Issue, IssueKind, QualityChecker, QualityReport};
pub use rules::{NumericRange, RuleRegistry, RuleSet};
pub use store::{Category, DocumentKey, ReportStore};
