//! Fingerprints, metadata snapshots and lineage.

mod fingerprint;
mod lineage;
mod metadata;

pub use fingerprint::{Fingerprint, Fingerprinter};
pub use lineage::{LineageRecord, LineageTracker, LineageView, TransformationLogEntry};
pub use metadata::{ColumnStats, MetadataRecorder, MetadataSnapshot};
