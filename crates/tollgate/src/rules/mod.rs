//! Declarative validation rules, keyed by dataset name.

mod registry;
mod rule_set;

pub use registry::RuleRegistry;
pub use rule_set::{NumericRange, RuleSet};
