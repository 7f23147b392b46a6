//! Quality report types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rules::NumericRange;

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Required columns absent from the dataset.
    MissingColumns,
    /// Null cells in a non-null column.
    NullViolation,
    /// Repeated values in a unique column.
    UniqueViolation,
    /// Numeric values outside their inclusive bounds.
    RangeViolation,
    /// A date column could not be parsed.
    DateParseError,
    /// Dates later than the check time.
    FutureDate,
}

impl IssueKind {
    /// Get a human-readable label for the issue kind.
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::MissingColumns => "Missing Columns",
            IssueKind::NullViolation => "Null Violation",
            IssueKind::UniqueViolation => "Unique Violation",
            IssueKind::RangeViolation => "Range Violation",
            IssueKind::DateParseError => "Date Parse Error",
            IssueKind::FutureDate => "Future Date",
        }
    }
}

/// One problem found in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Affected column, when the issue concerns a single one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Number of offending cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    pub fn missing_columns<S: AsRef<str>>(missing: &[S]) -> Self {
        let names: Vec<&str> = missing.iter().map(|s| s.as_ref()).collect();
        Self {
            kind: IssueKind::MissingColumns,
            column: None,
            count: Some(names.len()),
            message: format!("Missing required columns: {}", names.join(", ")),
        }
    }

    pub fn null_violation(column: &str, count: usize) -> Self {
        Self {
            kind: IssueKind::NullViolation,
            column: Some(column.to_string()),
            count: Some(count),
            message: format!("Found {} null values in {}", count, column),
        }
    }

    pub fn unique_violation(column: &str, count: usize) -> Self {
        Self {
            kind: IssueKind::UniqueViolation,
            column: Some(column.to_string()),
            count: Some(count),
            message: format!("Found {} duplicate values in {}", count, column),
        }
    }

    pub fn range_violation(column: &str, range: NumericRange, count: usize) -> Self {
        Self {
            kind: IssueKind::RangeViolation,
            column: Some(column.to_string()),
            count: Some(count),
            message: format!(
                "Found {} values outside range ({}, {}) in {}",
                count, range.min, range.max, column
            ),
        }
    }

    pub fn date_parse_error(column: &str, reason: &str) -> Self {
        Self {
            kind: IssueKind::DateParseError,
            column: Some(column.to_string()),
            count: None,
            message: format!("Error parsing dates in {}: {}", column, reason),
        }
    }

    pub fn future_date(column: &str, count: usize) -> Self {
        Self {
            kind: IssueKind::FutureDate,
            column: Some(column.to_string()),
            count: Some(count),
            message: format!("Found {} future dates in {}", count, column),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Descriptive statistics for a numeric column.
///
/// Statistics that are undefined for the number of present values (e.g. the
/// standard deviation of a single value) are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q1: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

/// Column-level statistics attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub null_counts: IndexMap<String, usize>,
    pub unique_counts: IndexMap<String, usize>,
    pub numeric_columns_stats: IndexMap<String, NumericSummary>,
}

/// Outcome of checking one dataset against its rule set.
///
/// `passed` is derived from `issues` and cannot disagree with it; documents
/// whose flag contradicts their issues are rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReportDocument")]
pub struct QualityReport {
    #[serde(rename = "dataset")]
    dataset_name: String,
    timestamp: String,
    total_rows: usize,
    issues: Vec<Issue>,
    summary: ReportSummary,
    passed: bool,
}

impl QualityReport {
    pub fn new(
        dataset_name: impl Into<String>,
        timestamp: impl Into<String>,
        total_rows: usize,
        issues: Vec<Issue>,
        summary: ReportSummary,
    ) -> Self {
        let passed = issues.is_empty();
        Self {
            dataset_name: dataset_name.into(),
            timestamp: timestamp.into(),
            total_rows,
            issues,
            summary,
            passed,
        }
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Second-resolution check time (`YYYYmmdd_HHMMSS`).
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Issue messages in report order.
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }

    /// Issues of one kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

/// Wire form of a report, checked before it becomes a [`QualityReport`].
#[derive(Deserialize)]
struct ReportDocument {
    dataset: String,
    timestamp: String,
    total_rows: usize,
    issues: Vec<Issue>,
    summary: ReportSummary,
    passed: bool,
}

impl TryFrom<ReportDocument> for QualityReport {
    type Error = String;

    fn try_from(doc: ReportDocument) -> Result<Self, Self::Error> {
        if doc.passed != doc.issues.is_empty() {
            return Err(format!(
                "report for '{}' has passed={} with {} issues",
                doc.dataset,
                doc.passed,
                doc.issues.len()
            ));
        }
        Ok(QualityReport::new(
            doc.dataset,
            doc.timestamp,
            doc.total_rows,
            doc.issues,
            doc.summary,
        ))
    }
}
