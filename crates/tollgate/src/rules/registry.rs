//! Immutable registry of rule sets.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Result, TollgateError};

use super::rule_set::RuleSet;

/// Maps dataset names to their [`RuleSet`].
///
/// Built once and never mutated; share it behind an `Arc` when several
/// checkers need it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRegistry {
    rules: IndexMap<String, RuleSet>,
}

impl RuleRegistry {
    /// Build a registry, validating every rule set.
    pub fn new<N: Into<String>>(rules: impl IntoIterator<Item = (N, RuleSet)>) -> Result<Self> {
        let mut map = IndexMap::new();
        for (name, rule_set) in rules {
            let name = name.into();
            rule_set.validate(&name)?;
            if map.insert(name.clone(), rule_set).is_some() {
                return Err(TollgateError::Config(format!(
                    "rule set for '{}' defined twice",
                    name
                )));
            }
        }
        Ok(Self { rules: map })
    }

    /// Parse a rules document: a JSON object keyed by dataset name.
    ///
    /// ```
    /// use tollgate::RuleRegistry;
    ///
    /// let registry = RuleRegistry::from_json_str(r#"{
    ///     "customers": {
    ///         "required_columns": ["customer_id"],
    ///         "unique_columns": ["customer_id"]
    ///     }
    /// }"#).unwrap();
    /// assert!(registry.get("customers").is_some());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: IndexMap<String, RuleSet> = serde_json::from_str(json)
            .map_err(|e| TollgateError::Config(format!("invalid rules document: {}", e)))?;
        Self::new(rules)
    }

    /// Load a rules document from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| TollgateError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&json)
    }

    /// Rules for the e-commerce order datasets the pipeline ingests.
    pub fn ecommerce_defaults() -> Self {
        let orders = RuleSet::new()
            .with_required([
                "order_id",
                "customer_id",
                "order_status",
                "order_purchase_timestamp",
            ])
            .with_unique(["order_id"])
            .with_non_null(["order_id", "customer_id", "order_status"])
            .with_dates(["order_purchase_timestamp", "order_delivered_customer_date"]);

        let order_items = RuleSet::new()
            .with_required(["order_id", "product_id", "price", "freight_value"])
            .with_non_null(["order_id", "product_id", "price"])
            .with_range("price", 0.0, 10_000.0)
            .with_range("freight_value", 0.0, 1_000.0);

        let customers = RuleSet::new()
            .with_required(["customer_id", "customer_city", "customer_state"])
            .with_unique(["customer_id"])
            .with_non_null(["customer_id"]);

        let rules = IndexMap::from([
            ("orders".to_string(), orders),
            ("order_items".to_string(), order_items),
            ("customers".to_string(), customers),
        ]);
        Self { rules }
    }

    /// Look up the rules for a dataset name.
    pub fn get(&self, dataset_name: &str) -> Option<&RuleSet> {
        self.rules.get(dataset_name)
    }

    /// Look up the rules for a dataset name, failing if none are registered.
    pub fn require(&self, dataset_name: &str) -> Result<&RuleSet> {
        self.get(dataset_name)
            .ok_or_else(|| TollgateError::UnknownDataset(dataset_name.to_string()))
    }

    /// Registered dataset names in definition order.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_unknown_dataset() {
        let registry = RuleRegistry::ecommerce_defaults();
        let err = registry.require("payments").unwrap_err();
        assert!(matches!(err, TollgateError::UnknownDataset(ref n) if n == "payments"));
    }

    #[test]
    fn test_defaults() {
        let registry = RuleRegistry::ecommerce_defaults();
        assert_eq!(
            registry.dataset_names().collect::<Vec<_>>(),
            vec!["orders", "order_items", "customers"]
        );
        let items = registry.require("order_items").unwrap();
        assert_eq!(items.numeric_ranges["freight_value"].max, 1_000.0);
    }

    #[test]
    fn test_from_json_ignores_unknown_keys() {
        let registry = RuleRegistry::from_json_str(
            r#"{"orders": {"required_columns": ["order_id"], "valid_statuses": ["delivered"]}}"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_json_rejects_bad_range() {
        let err = RuleRegistry::from_json_str(r#"{"x": {"numeric_ranges": {"p": [5, 1]}}}"#)
            .unwrap_err();
        assert!(matches!(err, TollgateError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        let err = RuleRegistry::from_json_str("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("invalid rules document"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = RuleRegistry::new([("a", RuleSet::new()), ("a", RuleSet::new())]);
        assert!(result.is_err());
    }
}
