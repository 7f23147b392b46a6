//! Dataset identity hashes.
//!
//! Two hashes with very different guarantees:
//!
//! - [`Fingerprinter::compute`] looks only at the shape, the column order and
//!   the first index label. It is cheap and stable, but two datasets with the
//!   same layout and first label collide even when every cell differs. Treat
//!   equal fingerprints as "possibly the same", never as proof.
//! - [`Fingerprinter::content_hash`] covers column names, types and every
//!   cell, for callers that need real deduplication.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::input::{Dataset, Value};

/// Lowercase hex SHA-256 of a dataset's layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes fingerprints and content hashes.
pub struct Fingerprinter;

impl Fingerprinter {
    /// Weak identity over `(shape, column order, first index label)`.
    pub fn compute(dataset: &Dataset) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(Self::layout_key(dataset).as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    /// The string the fingerprint is hashed from, e.g.
    /// `(5, 2)_[order_id, price]_0`. An empty dataset has an empty label.
    pub fn layout_key(dataset: &Dataset) -> String {
        let (rows, cols) = dataset.shape();
        let columns: Vec<&str> = dataset.column_names().collect();
        let first = dataset
            .first_index()
            .map(|v| v.to_string())
            .unwrap_or_default();
        format!("({}, {})_[{}]_{}", rows, cols, columns.join(", "), first)
    }

    /// Full-content SHA-256 over names, types and every cell in row order
    /// within each column.
    pub fn content_hash(dataset: &Dataset) -> String {
        let mut hasher = Sha256::new();
        for label in dataset.index() {
            hash_value(&mut hasher, label);
        }
        for (name, column) in dataset.columns() {
            hash_bytes(&mut hasher, name.as_bytes());
            hash_bytes(&mut hasher, column.dtype().to_string().as_bytes());
            for value in column.values() {
                hash_value(&mut hasher, value);
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Length-prefixed so adjacent fields cannot run together.
fn hash_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    if value.is_null() {
        hasher.update([0u8]);
        return;
    }
    let tag = match value {
        Value::Null => 0u8,
        Value::Integer(_) => 1,
        Value::Float(_) => 2,
        Value::Boolean(_) => 3,
        Value::DateTime(_) => 4,
        Value::String(_) => 5,
    };
    hasher.update([tag]);
    match value {
        Value::Float(f) => hasher.update(f.to_bits().to_le_bytes()),
        other => hash_bytes(hasher, other.to_string().as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Column;

    fn dataset(values: [i64; 3]) -> Dataset {
        Dataset::from_columns([
            ("id", Column::strings([Some("a"), Some("b"), Some("c")])),
            ("price", Column::integers(values.map(Some))),
        ])
        .unwrap()
    }

    #[test]
    fn test_layout_key() {
        assert_eq!(
            Fingerprinter::layout_key(&dataset([1, 2, 3])),
            "(3, 2)_[id, price]_0"
        );
        assert_eq!(Fingerprinter::layout_key(&Dataset::new()), "(0, 0)_[]_");
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = Fingerprinter::compute(&dataset([1, 2, 3]));
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_same_layout_collides_but_content_differs() {
        let a = dataset([1, 2, 3]);
        let b = dataset([7, 8, 9]);
        assert_eq!(Fingerprinter::compute(&a), Fingerprinter::compute(&b));
        assert_ne!(Fingerprinter::content_hash(&a), Fingerprinter::content_hash(&b));
    }

    #[test]
    fn test_column_order_changes_fingerprint() {
        let a = dataset([1, 2, 3]);
        let b = Dataset::from_columns([
            ("price", Column::integers([Some(1), Some(2), Some(3)])),
            ("id", Column::strings([Some("a"), Some("b"), Some("c")])),
        ])
        .unwrap();
        assert_ne!(Fingerprinter::compute(&a), Fingerprinter::compute(&b));
    }

    #[test]
    fn test_first_label_changes_fingerprint() {
        let a = dataset([1, 2, 3]);
        let b = dataset([1, 2, 3])
            .with_index(vec![Value::Integer(10), Value::Integer(11), Value::Integer(12)])
            .unwrap();
        assert_ne!(Fingerprinter::compute(&a), Fingerprinter::compute(&b));
    }

    #[test]
    fn test_content_hash_separates_null_from_empty() {
        let a = Dataset::from_columns([("s", Column::strings([None::<&str>]))]).unwrap();
        let b = Dataset::from_columns([("s", Column::strings([Some("")]))]).unwrap();
        assert_ne!(Fingerprinter::content_hash(&a), Fingerprinter::content_hash(&b));
    }
}
