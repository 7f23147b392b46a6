//! Structural snapshots of datasets at named stages.

use std::sync::Arc;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::{ColumnType, Dataset};
use crate::store::{self, Category, DocumentKey, ReportStore};

use super::fingerprint::{Fingerprint, Fingerprinter};
use super::lineage::{LineageRecord, LineageTracker};

/// Null and distinct counts for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub null_count: usize,
    pub unique_count: usize,
}

/// Schema and size of a dataset as seen at one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub dataset_name: String,
    pub stage: String,
    /// Stamp of the snapshot; matches the label of its stored key unless a
    /// same-second collision forced a suffix.
    pub timestamp: String,
    pub shape: (usize, usize),
    pub columns: Vec<String>,
    pub dtypes: IndexMap<String, ColumnType>,
    pub row_count: usize,
    /// Approximate in-memory size in bytes.
    #[serde(rename = "memory_usage")]
    pub memory_estimate: usize,
    pub column_stats: IndexMap<String, ColumnStats>,
    #[serde(rename = "data_fingerprint")]
    pub fingerprint: Fingerprint,
    pub content_hash: String,
}

/// Captures [`MetadataSnapshot`]s and the matching lineage records.
pub struct MetadataRecorder {
    store: Arc<ReportStore>,
    lineage: LineageTracker,
}

impl MetadataRecorder {
    pub fn new(store: Arc<ReportStore>) -> Self {
        let lineage = LineageTracker::new(Arc::clone(&store));
        Self { store, lineage }
    }

    /// The tracker stage records are written through.
    pub fn lineage(&self) -> &LineageTracker {
        &self.lineage
    }

    /// Build a snapshot of `dataset` as of `at` without persisting it.
    pub fn snapshot(dataset: &Dataset, name: &str, stage: &str, at: NaiveDateTime) -> MetadataSnapshot {
        let dtypes = dataset
            .columns()
            .map(|(col, column)| (col.to_string(), column.dtype()))
            .collect();
        let column_stats = dataset
            .columns()
            .map(|(col, column)| {
                (
                    col.to_string(),
                    ColumnStats {
                        null_count: column.null_count(),
                        unique_count: column.unique_count(),
                    },
                )
            })
            .collect();

        MetadataSnapshot {
            dataset_name: name.to_string(),
            stage: stage.to_string(),
            timestamp: store::stamp(at),
            shape: dataset.shape(),
            columns: dataset.column_names().map(String::from).collect(),
            dtypes,
            row_count: dataset.row_count(),
            memory_estimate: dataset.memory_estimate(),
            column_stats,
            fingerprint: Fingerprinter::compute(dataset),
            content_hash: Fingerprinter::content_hash(dataset),
        }
    }

    /// Snapshot `dataset` at `stage`, persist it, then persist a lineage
    /// record under the same key label.
    ///
    /// Two calls for the same name within one second get distinct keys
    /// (`_1`, `_2`, ... appended to the stamp); neither overwrites the other.
    /// The lineage record takes the next free label if a stage record
    /// written elsewhere already holds the metadata label.
    pub fn track(&self, dataset: &Dataset, name: &str, stage: &str) -> Result<MetadataSnapshot> {
        let snapshot = Self::snapshot(dataset, name, stage, store::now_local());

        let key = DocumentKey::snapshot(Category::Metadata, name, &snapshot.timestamp);
        let key = self.store.persist_new(&snapshot, &key)?;
        let label = key.label().unwrap_or(snapshot.timestamp.as_str());

        let record = LineageRecord::new(
            name,
            stage,
            snapshot.timestamp.as_str(),
            snapshot.fingerprint.clone(),
            snapshot.row_count,
        );
        self.lineage.record_stage_at(&record, label)?;

        tracing::info!(
            dataset = name,
            stage,
            rows = snapshot.row_count,
            fingerprint = %snapshot.fingerprint,
            file = %key.file_name(),
            "Tracked dataset"
        );
        Ok(snapshot)
    }

    /// Stored snapshots of `name`, oldest first.
    ///
    /// Unreadable documents are skipped with a warning.
    pub fn history(&self, name: &str) -> Result<Vec<MetadataSnapshot>> {
        self.store.load_all(Category::Metadata, name)
    }
}
