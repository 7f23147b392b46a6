//! Stage records and transformation logs.
//!
//! Stage records and transformation logs are stored independently: a
//! [`LineageRecord`] is written at every tracked stage with empty
//! `transformations`/`source_datasets`, and transformations accumulate in a
//! per-`(source, target)` log. [`LineageTracker::lineage_of`] joins the two on
//! read.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, TollgateError};
use crate::input::Dataset;
use crate::store::{self, Category, DocumentKey, ReportStore};

use super::fingerprint::{Fingerprint, Fingerprinter};

/// A dataset observed at one processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub dataset_name: String,
    pub stage: String,
    pub timestamp: String,
    pub fingerprint: Fingerprint,
    pub row_count: usize,
    #[serde(default)]
    pub transformations: Vec<JsonValue>,
    #[serde(default)]
    pub source_datasets: Vec<String>,
}

impl LineageRecord {
    /// A fresh record with no transformations or sources attached.
    pub fn new(
        dataset_name: impl Into<String>,
        stage: impl Into<String>,
        timestamp: impl Into<String>,
        fingerprint: Fingerprint,
        row_count: usize,
    ) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            stage: stage.into(),
            timestamp: timestamp.into(),
            fingerprint,
            row_count,
            transformations: Vec::new(),
            source_datasets: Vec::new(),
        }
    }
}

/// One derivation of `target_dataset` from `source_dataset`.
///
/// `source_dataset` may name several datasets joined by commas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationLogEntry {
    pub timestamp: String,
    pub source_dataset: String,
    pub target_dataset: String,
    pub transformation_type: String,
    #[serde(default)]
    pub transformation_details: IndexMap<String, JsonValue>,
}

impl TransformationLogEntry {
    /// Individual source names.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.source_dataset
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Everything recorded about one dataset name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageView {
    pub dataset_name: String,
    /// Stage records, oldest first.
    pub stages: Vec<LineageRecord>,
    /// Transformations that produced this dataset, grouped by source.
    pub incoming: Vec<TransformationLogEntry>,
}

impl LineageView {
    /// Distinct upstream dataset names in first-seen order.
    pub fn upstream(&self) -> Vec<&str> {
        let names: IndexSet<&str> = self.incoming.iter().flat_map(|e| e.sources()).collect();
        names.into_iter().collect()
    }

    /// The most recent stage record, if any.
    pub fn latest(&self) -> Option<&LineageRecord> {
        self.stages.last()
    }
}

/// Records stage transitions and transformation edges.
pub struct LineageTracker {
    store: Arc<ReportStore>,
}

impl LineageTracker {
    pub fn new(store: Arc<ReportStore>) -> Self {
        Self { store }
    }

    /// Record `dataset` at `stage` under a fresh key.
    pub fn record_stage(&self, dataset: &Dataset, name: &str, stage: &str) -> Result<LineageRecord> {
        let label = store::stamp(store::now_local());
        let record = LineageRecord::new(
            name,
            stage,
            label.as_str(),
            Fingerprinter::compute(dataset),
            dataset.row_count(),
        );
        let key = DocumentKey::snapshot(Category::Lineage, name, &label);
        let key = self.store.persist_new(&record, &key)?;
        tracing::info!(dataset = name, stage, file = %key.file_name(), "Recorded lineage stage");
        Ok(record)
    }

    /// Write `record` under `label`, or under a suffixed label if a stage
    /// record already holds it.
    pub(crate) fn record_stage_at(&self, record: &LineageRecord, label: &str) -> Result<DocumentKey> {
        let key = DocumentKey::snapshot(Category::Lineage, &record.dataset_name, label);
        self.store.persist_new(record, &key)
    }

    /// Append a transformation to the `(source, target)` log.
    ///
    /// Concurrent calls through the same store are serialized per log, so no
    /// entry is lost. A stored log that is not a list is replaced.
    pub fn log_transformation(
        &self,
        source: &str,
        target: &str,
        transformation_type: &str,
        details: IndexMap<String, JsonValue>,
    ) -> Result<TransformationLogEntry> {
        let entry = TransformationLogEntry {
            timestamp: store::stamp(store::now_local()),
            source_dataset: source.to_string(),
            target_dataset: target.to_string(),
            transformation_type: transformation_type.to_string(),
            transformation_details: details,
        };

        let key = DocumentKey::transformation(source, target);
        let len = self.store.append(&key, &entry)?;
        tracing::info!(
            source,
            target,
            transformation_type,
            entries = len,
            "Logged transformation"
        );
        Ok(entry)
    }

    /// Entries logged for `(source, target)`, oldest first.
    ///
    /// Different pairs can share a log file (`a_to_b -> c` and `a -> b_to_c`),
    /// so entries are matched on their stored names.
    pub fn transformations(&self, source: &str, target: &str) -> Result<Vec<TransformationLogEntry>> {
        let mut entries = self.read_log(&DocumentKey::transformation(source, target))?;
        entries.retain(|e| e.source_dataset == source && e.target_dataset == target);
        Ok(entries)
    }

    /// Join the stage records of `name` with every transformation into it.
    pub fn lineage_of(&self, name: &str) -> Result<LineageView> {
        let stages = self.store.load_all::<LineageRecord>(Category::Lineage, name)?;

        // Log file names only narrow the search; `x_to_name` also matches
        // a target called `pre_to_name`.
        let mut incoming = Vec::new();
        for key in self.store.list_transformations_into(name)? {
            incoming.extend(
                self.read_log(&key)?
                    .into_iter()
                    .filter(|e| e.target_dataset == name),
            );
        }

        Ok(LineageView {
            dataset_name: name.to_string(),
            stages,
            incoming,
        })
    }

    fn read_log(&self, key: &DocumentKey) -> Result<Vec<TransformationLogEntry>> {
        match self.store.load::<JsonValue>(key)? {
            None => Ok(Vec::new()),
            Some(JsonValue::Array(items)) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(TollgateError::from))
                .collect(),
            Some(_) => {
                tracing::warn!(file = %key.file_name(), "Stored log is not a list; ignoring it");
                Ok(Vec::new())
            }
        }
    }
}
