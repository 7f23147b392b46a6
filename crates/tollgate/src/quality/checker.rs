//! Rule-driven dataset checking.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::input::Dataset;
use crate::rules::RuleRegistry;
use crate::store::{self, Category, DocumentKey, ReportStore};

use super::checks::{Check, DateCheck, NonNullCheck, RangeCheck, RequiredColumnsCheck, UniquenessCheck};
use super::report::QualityReport;
use super::stats;

/// Checks datasets against their registered rule sets and persists the
/// resulting reports.
pub struct QualityChecker {
    registry: Arc<RuleRegistry>,
    store: Arc<ReportStore>,
    checks: Vec<Box<dyn Check + Send + Sync>>,
}

impl QualityChecker {
    /// Create a checker over an immutable registry and a shared store.
    pub fn new(registry: Arc<RuleRegistry>, store: Arc<ReportStore>) -> Self {
        Self {
            registry,
            store,
            checks: vec![
                Box::new(RequiredColumnsCheck),
                Box::new(NonNullCheck),
                Box::new(UniquenessCheck),
                Box::new(RangeCheck),
            ],
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Check `dataset` against the rules for `dataset_name` and persist the
    /// report under `(dataset_name, stamp)`.
    ///
    /// A failing report is returned, not raised. An unregistered name fails
    /// before anything is written.
    pub fn check(&self, dataset: &Dataset, dataset_name: &str) -> Result<QualityReport> {
        let report = self.evaluate(dataset, dataset_name, store::now_local())?;

        let key = DocumentKey::snapshot(Category::QualityReport, dataset_name, report.timestamp());
        let key = self.store.persist_new(&report, &key)?;

        if report.passed() {
            tracing::info!(
                dataset = dataset_name,
                rows = report.total_rows(),
                file = %key.file_name(),
                "Quality check passed"
            );
        } else {
            tracing::warn!(
                dataset = dataset_name,
                rows = report.total_rows(),
                issues = report.issues().len(),
                file = %key.file_name(),
                "Quality check failed"
            );
        }

        Ok(report)
    }

    /// Build the report for `dataset` as of `now` without persisting it.
    pub fn evaluate(
        &self,
        dataset: &Dataset,
        dataset_name: &str,
        now: NaiveDateTime,
    ) -> Result<QualityReport> {
        let rules = self.registry.require(dataset_name)?;

        let mut issues = Vec::new();
        for check in &self.checks {
            let found = check.evaluate(dataset, rules);
            if !found.is_empty() {
                tracing::debug!(check = check.name(), count = found.len(), "Check raised issues");
            }
            issues.extend(found);
        }

        let dates = DateCheck::new(now).coerce(dataset, rules);
        issues.extend(dates.issues);

        let summary = stats::summarize(&dates.dataset);

        Ok(QualityReport::new(
            dataset_name,
            store::stamp(now),
            dataset.row_count(),
            issues,
            summary,
        ))
    }
}
