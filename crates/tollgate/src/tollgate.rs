//! Main Tollgate struct and public API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::governance::{LineageTracker, LineageView, MetadataRecorder, MetadataSnapshot, TransformationLogEntry};
use crate::input::{Dataset, Parser, ParserConfig};
use crate::quality::{QualityChecker, QualityReport};
use crate::rules::RuleRegistry;
use crate::store::ReportStore;

/// Configuration for a [`Tollgate`] instance.
#[derive(Debug, Clone)]
pub struct TollgateConfig {
    /// Root directory for reports, snapshots and lineage.
    pub log_dir: PathBuf,
    /// Parser configuration used by [`Tollgate::load`].
    pub parser: ParserConfig,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            parser: ParserConfig::default(),
        }
    }
}

impl TollgateConfig {
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// Result of [`Tollgate::ingest`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The dataset passed its checks and was tracked.
    Accepted {
        report: QualityReport,
        snapshot: MetadataSnapshot,
    },
    /// The dataset failed its checks; nothing was tracked.
    Rejected { report: QualityReport },
}

impl IngestOutcome {
    pub fn report(&self) -> &QualityReport {
        match self {
            IngestOutcome::Accepted { report, .. } | IngestOutcome::Rejected { report } => report,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted { .. })
    }
}

/// Quality gate and lineage tracker over one store.
pub struct Tollgate {
    config: TollgateConfig,
    parser: Parser,
    store: Arc<ReportStore>,
    checker: QualityChecker,
    recorder: MetadataRecorder,
}

impl Tollgate {
    /// Create an instance with default configuration.
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_config(registry, TollgateConfig::default())
    }

    /// Create an instance with custom configuration.
    pub fn with_config(registry: RuleRegistry, config: TollgateConfig) -> Self {
        let store = Arc::new(ReportStore::from_config(&config));
        let parser = Parser::with_config(config.parser.clone());
        let checker = QualityChecker::new(Arc::new(registry), Arc::clone(&store));
        let recorder = MetadataRecorder::new(Arc::clone(&store));

        Self {
            config,
            parser,
            store,
            checker,
            recorder,
        }
    }

    /// Load a delimited file into a dataset.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        self.parser.parse_file(path)
    }

    /// Check a dataset against its rules and persist the report.
    pub fn check(&self, dataset: &Dataset, name: &str) -> Result<QualityReport> {
        self.checker.check(dataset, name)
    }

    /// Snapshot a dataset at a stage and record its lineage.
    pub fn track(&self, dataset: &Dataset, name: &str, stage: &str) -> Result<MetadataSnapshot> {
        self.recorder.track(dataset, name, stage)
    }

    /// Check a dataset and, only if it passes, track it at `stage`.
    pub fn ingest(&self, dataset: &Dataset, name: &str, stage: &str) -> Result<IngestOutcome> {
        let report = self.check(dataset, name)?;
        if !report.passed() {
            return Ok(IngestOutcome::Rejected { report });
        }
        let snapshot = self.track(dataset, name, stage)?;
        Ok(IngestOutcome::Accepted { report, snapshot })
    }

    /// Record that `target` was derived from `source`.
    pub fn log_transformation(
        &self,
        source: &str,
        target: &str,
        transformation_type: &str,
        details: IndexMap<String, JsonValue>,
    ) -> Result<TransformationLogEntry> {
        self.lineage()
            .log_transformation(source, target, transformation_type, details)
    }

    /// Stage records and incoming transformations of `name`.
    pub fn lineage_of(&self, name: &str) -> Result<LineageView> {
        self.lineage().lineage_of(name)
    }

    pub fn config(&self) -> &TollgateConfig {
        &self.config
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn checker(&self) -> &QualityChecker {
        &self.checker
    }

    pub fn recorder(&self) -> &MetadataRecorder {
        &self.recorder
    }

    pub fn lineage(&self) -> &LineageTracker {
        self.recorder.lineage()
    }
}
