//! Error types for the Tollgate library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Tollgate operations.
///
/// Data-level problems found while checking a dataset are not errors: they
/// are reported as [`Issue`](crate::quality::Issue)s inside a
/// [`QualityReport`](crate::quality::QualityReport).
#[derive(Debug, Error)]
pub enum TollgateError {
    /// No rule set is registered for the requested dataset name.
    #[error("No rule set registered for dataset '{0}'")]
    UnknownDataset(String),

    /// Invalid rule or registry configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure writing or reading a persisted document.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A per-key store lock was poisoned by a panicked writer.
    #[error("Store lock poisoned for '{0}'")]
    LockPoisoned(PathBuf),

    /// Error parsing CSV/TSV data.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset could not be assembled from the given columns.
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Empty file or no columns to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_dataset_names_dataset() {
        let err = TollgateError::UnknownDataset("payments".to_string());
        assert_eq!(
            err.to_string(),
            "No rule set registered for dataset 'payments'"
        );
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = TollgateError::Io {
            path: PathBuf::from("data/orders.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/orders.csv"), "got: {msg}");
        assert!(msg.contains("gone"));
    }
}
