//! Rule checks.
//!
//! Each check is independent: it looks only at the dataset and the rule set
//! and returns zero or more issues. A rule that names a column the dataset
//! lacks is skipped for that column; absence is reported once, by
//! [`RequiredColumnsCheck`], when the column is required.

use std::borrow::Cow;

use chrono::NaiveDateTime;

use crate::input::{temporal, Dataset};
use crate::rules::RuleSet;

use super::report::Issue;

/// A single rule check.
pub trait Check {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Run the check and return the issues found.
    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue>;
}

fn skip_absent(check: &str, column: &str) {
    tracing::debug!(check, column, "Column absent; skipping rule");
}

/// Required columns must all be present.
pub struct RequiredColumnsCheck;

impl Check for RequiredColumnsCheck {
    fn name(&self) -> &'static str {
        "required_columns"
    }

    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue> {
        let missing: Vec<&str> = rules
            .required_columns
            .iter()
            .map(String::as_str)
            .filter(|c| !dataset.has_column(c))
            .collect();

        if missing.is_empty() {
            Vec::new()
        } else {
            vec![Issue::missing_columns(&missing)]
        }
    }
}

/// Non-null columns must not contain missing cells.
pub struct NonNullCheck;

impl Check for NonNullCheck {
    fn name(&self) -> &'static str {
        "non_null"
    }

    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue> {
        rules
            .non_null_columns
            .iter()
            .filter_map(|name| {
                let Some(column) = dataset.column(name) else {
                    skip_absent(self.name(), name);
                    return None;
                };
                let nulls = column.null_count();
                (nulls > 0).then(|| Issue::null_violation(name, nulls))
            })
            .collect()
    }
}

/// Unique columns must not repeat a value.
///
/// Counts every row after the first occurrence of its value; missing cells
/// count as one shared value.
pub struct UniquenessCheck;

impl Check for UniquenessCheck {
    fn name(&self) -> &'static str {
        "unique"
    }

    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue> {
        rules
            .unique_columns
            .iter()
            .filter_map(|name| {
                let Some(column) = dataset.column(name) else {
                    skip_absent(self.name(), name);
                    return None;
                };
                let duplicates = column.duplicate_count();
                (duplicates > 0).then(|| Issue::unique_violation(name, duplicates))
            })
            .collect()
    }
}

/// Numeric values must fall within their inclusive bounds.
///
/// Missing and non-numeric cells are not counted.
pub struct RangeCheck;

impl Check for RangeCheck {
    fn name(&self) -> &'static str {
        "numeric_range"
    }

    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue> {
        rules
            .numeric_ranges
            .iter()
            .filter_map(|(name, range)| {
                let Some(column) = dataset.column(name) else {
                    skip_absent(self.name(), name);
                    return None;
                };
                let outside = column
                    .numeric_values()
                    .filter(|v| !range.contains(*v))
                    .count();
                (outside > 0).then(|| Issue::range_violation(name, *range, outside))
            })
            .collect()
    }
}

/// Date columns must parse and must not lie after `now`.
pub struct DateCheck {
    now: NaiveDateTime,
}

/// Issues from [`DateCheck`] plus the dataset with date columns coerced.
pub struct DateOutcome<'a> {
    pub issues: Vec<Issue>,
    pub dataset: Cow<'a, Dataset>,
}

impl DateCheck {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Coerce every configured date column and count future values.
    ///
    /// The input is never modified; a copy is made only when a column
    /// actually changes type. A column that fails to parse keeps its
    /// original values.
    pub fn coerce<'a>(&self, dataset: &'a Dataset, rules: &RuleSet) -> DateOutcome<'a> {
        let mut issues = Vec::new();
        let mut current = Cow::Borrowed(dataset);

        for name in &rules.date_columns {
            let Some(column) = current.column(name) else {
                skip_absent(self.name(), name);
                continue;
            };

            match temporal::coerce_to_datetime(column) {
                Ok(converted) => {
                    if let Some(converted) = converted {
                        current.to_mut().replace_column(name, converted);
                    }
                }
                Err(reason) => {
                    issues.push(Issue::date_parse_error(name, &reason));
                    continue;
                }
            }

            let future = current
                .column(name)
                .map(|c| {
                    c.values()
                        .iter()
                        .filter_map(|v| v.as_datetime())
                        .filter(|dt| *dt > self.now)
                        .count()
                })
                .unwrap_or(0);
            if future > 0 {
                issues.push(Issue::future_date(name, future));
            }
        }

        DateOutcome {
            issues,
            dataset: current,
        }
    }
}

impl Check for DateCheck {
    fn name(&self) -> &'static str {
        "date"
    }

    fn evaluate(&self, dataset: &Dataset, rules: &RuleSet) -> Vec<Issue> {
        self.coerce(dataset, rules).issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Column, ColumnType};
    use crate::quality::IssueKind;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_required_lists_only_missing() {
        let ds = Dataset::from_columns([("order_id", Column::strings([Some("o1")]))]).unwrap();
        let rules = RuleSet::new().with_required(["order_id", "customer_id", "order_status"]);

        let issues = RequiredColumnsCheck.evaluate(&ds, &rules);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingColumns);
        assert_eq!(
            issues[0].message,
            "Missing required columns: customer_id, order_status"
        );
    }

    #[test]
    fn test_non_null_counts_nulls() {
        let ds = Dataset::from_columns([(
            "customer_id",
            Column::strings([Some("c1"), None, None]),
        )])
        .unwrap();
        let rules = RuleSet::new().with_non_null(["customer_id", "absent"]);

        let issues = NonNullCheck.evaluate(&ds, &rules);
        assert_eq!(issues, vec![Issue::null_violation("customer_id", 2)]);
    }

    #[test]
    fn test_uniqueness_counts_extra_occurrences() {
        let ds = Dataset::from_columns([(
            "order_id",
            Column::strings([Some("a"), Some("b"), Some("a"), Some("a")]),
        )])
        .unwrap();
        let rules = RuleSet::new().with_unique(["order_id"]);

        let issues = UniquenessCheck.evaluate(&ds, &rules);
        assert_eq!(issues[0].count, Some(2));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let ds = Dataset::from_columns([(
            "price",
            Column::floats([Some(0.0), Some(10_000.0), Some(-0.5), Some(10_000.5), None]),
        )])
        .unwrap();
        let rules = RuleSet::new().with_range("price", 0.0, 10_000.0);

        let issues = RangeCheck.evaluate(&ds, &rules);
        assert_eq!(issues[0].count, Some(2));
    }

    #[test]
    fn test_range_skips_absent_column() {
        let ds = Dataset::from_columns([("x", Column::integers([Some(1)]))]).unwrap();
        let rules = RuleSet::new().with_range("price", 0.0, 1.0);
        assert!(RangeCheck.evaluate(&ds, &rules).is_empty());
    }

    #[test]
    fn test_dates_coerced_without_touching_input() {
        let ds = Dataset::from_columns([(
            "purchased",
            Column::strings([Some("2024-01-01 10:00:00"), Some("2031-01-01"), None]),
        )])
        .unwrap();
        let rules = RuleSet::new().with_dates(["purchased"]);

        let outcome = DateCheck::new(now()).coerce(&ds, &rules);
        assert_eq!(outcome.issues, vec![Issue::future_date("purchased", 1)]);
        assert_eq!(
            outcome.dataset.column("purchased").unwrap().dtype(),
            ColumnType::DateTime
        );
        assert_eq!(ds.column("purchased").unwrap().dtype(), ColumnType::String);
    }

    #[test]
    fn test_date_parse_error_continues() {
        let ds = Dataset::from_columns([
            ("a", Column::strings([Some("yesterday")])),
            ("b", Column::strings([Some("2099-01-01")])),
        ])
        .unwrap();
        let rules = RuleSet::new().with_dates(["a", "b"]);

        let outcome = DateCheck::new(now()).coerce(&ds, &rules);
        let kinds: Vec<IssueKind> = outcome.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::DateParseError, IssueKind::FutureDate]);
        assert_eq!(outcome.dataset.column("a").unwrap().dtype(), ColumnType::String);
    }

    #[test]
    fn test_present_instant_is_not_future() {
        let ds = Dataset::from_columns([("d", Column::datetimes([Some(now())]))]).unwrap();
        let rules = RuleSet::new().with_dates(["d"]);
        let outcome = DateCheck::new(now()).coerce(&ds, &rules);
        assert!(outcome.issues.is_empty());
        assert!(matches!(outcome.dataset, Cow::Borrowed(_)));
    }
}
