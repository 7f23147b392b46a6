//! The validation contract for one dataset.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TollgateError};

/// Inclusive numeric bounds: `min <= value <= max` is in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if the value lies within the bounds, edges included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<(f64, f64)> for NumericRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<NumericRange> for (f64, f64) {
    fn from(range: NumericRange) -> Self {
        (range.min, range.max)
    }
}

/// Rules applied to every dataset registered under one name.
///
/// Unknown keys in a rules document are ignored so that documents written
/// for other tools can be loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Columns that must be present.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub required_columns: IndexSet<String>,
    /// Columns whose values must not repeat.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub unique_columns: IndexSet<String>,
    /// Columns that must not contain nulls.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub non_null_columns: IndexSet<String>,
    /// Columns that must parse as dates and not lie in the future.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub date_columns: IndexSet<String>,
    /// Inclusive bounds for numeric columns.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub numeric_ranges: IndexMap<String, NumericRange>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.required_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_unique<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.unique_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_non_null<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.non_null_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_dates<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.date_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add inclusive bounds for a numeric column.
    pub fn with_range(mut self, column: impl Into<String>, min: f64, max: f64) -> Self {
        self.numeric_ranges
            .insert(column.into(), NumericRange::new(min, max));
        self
    }

    /// Check that the rule set is internally consistent.
    pub fn validate(&self, dataset_name: &str) -> Result<()> {
        for (column, range) in &self.numeric_ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(TollgateError::Config(format!(
                    "range for '{}.{}' must have finite bounds",
                    dataset_name, column
                )));
            }
            if range.min > range.max {
                return Err(TollgateError::Config(format!(
                    "range for '{}.{}' has min {} greater than max {}",
                    dataset_name, column, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let range = NumericRange::new(0.0, 10_000.0);
        assert!(range.contains(0.0));
        assert!(range.contains(10_000.0));
        assert!(!range.contains(-0.01));
        assert!(!range.contains(10_000.01));
    }

    #[test]
    fn test_builder() {
        let rules = RuleSet::new()
            .with_required(["order_id", "price"])
            .with_non_null(["order_id"])
            .with_range("price", 0.0, 10_000.0);

        assert_eq!(rules.required_columns.len(), 2);
        assert!(rules.non_null_columns.contains("order_id"));
        assert_eq!(rules.numeric_ranges["price"], NumericRange::new(0.0, 10_000.0));
    }

    #[test]
    fn test_range_deserializes_from_pair() {
        let rules: RuleSet =
            serde_json::from_str(r#"{"numeric_ranges": {"price": [0, 10000]}}"#).unwrap();
        assert_eq!(rules.numeric_ranges["price"], NumericRange::new(0.0, 10_000.0));
        assert!(rules.required_columns.is_empty());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let rules = RuleSet::new().with_range("price", 10.0, 0.0);
        let err = rules.validate("order_items").unwrap_err();
        assert!(err.to_string().contains("order_items.price"));
    }

    #[test]
    fn test_validate_rejects_infinite_bound() {
        let rules = RuleSet::new().with_range("price", f64::NEG_INFINITY, 0.0);
        assert!(rules.validate("x").is_err());
    }
}
