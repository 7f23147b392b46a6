//! Durable JSON documents for reports, snapshots and lineage.
//!
//! Every document lives under the store root:
//!
//! ```text
//! logs/
//! ├── data_quality_reports/
//! │   └── quality_report_orders_20240115_103000.json
//! ├── metadata/
//! │   └── metadata_orders_20240115_103000.json
//! └── lineage/
//!     ├── lineage_orders_20240115_103000.json
//!     └── transformation_orders,order_items_to_sales.json
//! ```
//!
//! Snapshot-style documents are keyed by `(name, stamp)` where the stamp is a
//! second-resolution timestamp; transformation logs are keyed by
//! `(source, target)`.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{Result, TollgateError};
use crate::tollgate::TollgateConfig;

/// Format of the second-resolution stamp used in keys and records.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A stamp, optionally followed by a collision suffix.
static STAMP_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}_\d{6}(_\d+)?$").unwrap());

/// Highest collision suffix tried before giving up on a key.
const MAX_SUFFIX: u32 = 10_000;

/// Render a local instant as a stamp.
pub fn stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// The current local wall-clock time.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Kind of persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    QualityReport,
    Metadata,
    Lineage,
    Transformation,
}

impl Category {
    /// Directory under the store root.
    pub fn directory(&self) -> &'static str {
        match self {
            Category::QualityReport => "data_quality_reports",
            Category::Metadata => "metadata",
            Category::Lineage | Category::Transformation => "lineage",
        }
    }

    /// File name prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::QualityReport => "quality_report",
            Category::Metadata => "metadata",
            Category::Lineage => "lineage",
            Category::Transformation => "transformation",
        }
    }
}

/// Deterministic address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    category: Category,
    name: String,
    label: Option<String>,
}

impl DocumentKey {
    /// Key for a snapshot-style document: `(category, name, stamp)`.
    pub fn snapshot(category: Category, name: &str, label: &str) -> Self {
        Self {
            category,
            name: sanitize(name),
            label: Some(label.to_string()),
        }
    }

    /// Key for the transformation log of a `(source, target)` pair.
    pub fn transformation(source: &str, target: &str) -> Self {
        Self {
            category: Category::Transformation,
            name: format!("{}_to_{}", sanitize(source), sanitize(target)),
            label: None,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stamp part of the key, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// File name of the document.
    pub fn file_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{}_{}_{}.json", self.category.prefix(), self.name, label),
            None => format!("{}_{}.json", self.category.prefix(), self.name),
        }
    }

    fn with_suffix(&self, n: u32) -> Self {
        let label = self.label.as_deref().unwrap_or_default();
        Self {
            category: self.category,
            name: self.name.clone(),
            label: Some(format!("{}_{}", label, n)),
        }
    }
}

/// Keep names from escaping their directory.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

/// File-backed document store.
///
/// Writes of whole documents go through a temporary file and a rename (or a
/// hard link, for fresh keys), so readers never observe a half-written
/// document. Appends to list documents hold a per-key lock for the whole
/// read-modify-write, which serializes writers sharing one store (e.g.
/// behind an `Arc`). Separate processes writing the same key are not
/// coordinated.
#[derive(Debug)]
pub struct ReportStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ReportStore {
    /// Open a store rooted at `root`. Directories are created on first write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open the store at the configured log directory.
    pub fn from_config(config: &TollgateConfig) -> Self {
        Self::open(&config.log_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where a key's document lives.
    pub fn path_for(&self, key: &DocumentKey) -> PathBuf {
        self.root
            .join(key.category().directory())
            .join(key.file_name())
    }

    /// Write a document at `key`, replacing any existing one.
    pub fn persist<T: Serialize>(&self, record: &T, key: &DocumentKey) -> Result<PathBuf> {
        let path = self.path_for(key);
        let contents = to_pretty_json(record)?;
        write_atomic(&path, &contents)?;
        Ok(path)
    }

    /// Write a document under a fresh key.
    ///
    /// If `key` is already taken, `_1`, `_2`, ... are appended to its stamp
    /// until a free slot is found. The document is written to a temp file
    /// first and then hard-linked to the candidate name; linking fails if the
    /// name exists, so concurrent callers never receive the same key and no
    /// reader ever sees a partial document.
    pub fn persist_new<T: Serialize>(&self, record: &T, key: &DocumentKey) -> Result<DocumentKey> {
        let contents = to_pretty_json(record)?;
        let tmp = write_temp(&self.path_for(key), &contents)?;
        let reserved = self.link_fresh(&tmp, key);
        let _ = fs::remove_file(&tmp);
        reserved
    }

    fn link_fresh(&self, tmp: &Path, key: &DocumentKey) -> Result<DocumentKey> {
        for n in 0..=MAX_SUFFIX {
            let candidate = if n == 0 { key.clone() } else { key.with_suffix(n) };
            let path = self.path_for(&candidate);

            match fs::hard_link(tmp, &path) {
                Ok(()) => {
                    if n > 0 {
                        tracing::debug!(
                            file = %candidate.file_name(),
                            "Key already taken; wrote under suffixed key"
                        );
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(write_error(&path, e)),
            }
        }

        Err(TollgateError::Persistence(format!(
            "No free key for '{}' after {} attempts",
            key.file_name(),
            MAX_SUFFIX
        )))
    }

    /// Read the document at `key`, if it exists.
    pub fn load<T: DeserializeOwned>(&self, key: &DocumentKey) -> Result<Option<T>> {
        let path = self.path_for(key);
        read_document(&path)
    }

    /// Every snapshot document of `category` stored for `name`, oldest first.
    ///
    /// Documents that do not parse as `T` are skipped with a warning.
    pub fn load_all<T: DeserializeOwned>(&self, category: Category, name: &str) -> Result<Vec<T>> {
        let mut documents = Vec::new();
        for key in self.list(category, name)? {
            let path = self.path_for(&key);
            let Some(raw) = read_raw(&path)? else {
                continue;
            };
            match serde_json::from_str(&raw) {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Skipping unreadable document"
                ),
            }
        }
        Ok(documents)
    }

    /// Append `entry` to the list document at `key`, returning the new length.
    ///
    /// A missing document starts a new list. A stored document that is not a
    /// JSON list is discarded and replaced by a fresh list; that loss is
    /// logged as a warning.
    pub fn append<T: Serialize>(&self, key: &DocumentKey, entry: &T) -> Result<usize> {
        let path = self.path_for(key);
        let lock = self.key_lock(&path)?;
        let _guard = lock
            .lock()
            .map_err(|_| TollgateError::LockPoisoned(path.clone()))?;

        let mut entries = match read_raw(&path)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<JsonValue>(&raw) {
                Ok(JsonValue::Array(items)) => items,
                Ok(other) => {
                    tracing::warn!(
                        path = %path.display(),
                        found = json_kind(&other),
                        "Stored log is not a list; starting a new one"
                    );
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Stored log is not valid JSON; starting a new one"
                    );
                    Vec::new()
                }
            },
        };

        entries.push(serde_json::to_value(entry)?);
        let contents = to_pretty_json(&entries)?;
        write_atomic(&path, &contents)?;
        Ok(entries.len())
    }

    /// Keys of all snapshot documents of `category` stored for `name`,
    /// oldest first.
    pub fn list(&self, category: Category, name: &str) -> Result<Vec<DocumentKey>> {
        let name = sanitize(name);
        let prefix = format!("{}_{}_", category.prefix(), name);

        let mut keys: Vec<DocumentKey> = self
            .file_stems(category)?
            .into_iter()
            .filter_map(|stem| {
                let label = stem.strip_prefix(&prefix)?;
                STAMP_LABEL
                    .is_match(label)
                    .then(|| DocumentKey::snapshot(category, &name, label))
            })
            .collect();

        keys.sort_by(|a, b| label_order(a.label()).cmp(&label_order(b.label())));
        Ok(keys)
    }

    /// Keys of every transformation log whose target is `target`.
    pub fn list_transformations_into(&self, target: &str) -> Result<Vec<DocumentKey>> {
        let prefix = format!("{}_", Category::Transformation.prefix());
        let suffix = format!("_to_{}", sanitize(target));

        let mut keys: Vec<DocumentKey> = self
            .file_stems(Category::Transformation)?
            .into_iter()
            .filter_map(|stem| {
                let name = stem.strip_prefix(&prefix)?;
                name.ends_with(&suffix).then(|| DocumentKey {
                    category: Category::Transformation,
                    name: name.to_string(),
                    label: None,
                })
            })
            .collect();

        keys.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(keys)
    }

    /// Stems of the `.json` files in a category's directory.
    fn file_stems(&self, category: Category) -> Result<Vec<String>> {
        let dir = self.root.join(category.directory());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            TollgateError::Persistence(format!(
                "Failed to read directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .collect())
    }

    /// Lock guarding the read-modify-write of one list document.
    ///
    /// Only [`ReportStore::append`] takes these, so the map holds one entry
    /// per transformation log.
    fn key_lock(&self, path: &Path) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| TollgateError::LockPoisoned(self.root.clone()))?;
        Ok(Arc::clone(
            locks.entry(path.to_path_buf()).or_default(),
        ))
    }
}

/// Sort key for stamp labels: the stamp, then the numeric collision suffix.
fn label_order(label: Option<&str>) -> (String, u32) {
    let label = label.unwrap_or_default();
    match label.get(15..) {
        Some(rest) if !rest.is_empty() => (
            label[..15].to_string(),
            rest.trim_start_matches('_').parse().unwrap_or(0),
        ),
        _ => (label.to_string(), 0),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(record: &T) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(|e| {
        TollgateError::Persistence(format!("Failed to serialize document: {}", e))
    })
}

fn write_error(path: &Path, e: std::io::Error) -> TollgateError {
    TollgateError::Persistence(format!("Failed to write '{}': {}", path.display(), e))
}

/// Create the parent directory if needed.
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TollgateError::Persistence(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Write `contents` to a fresh sibling of `path` and return the sibling.
///
/// The temp file is removed again if the write fails.
fn write_temp(path: &Path, contents: &str) -> Result<PathBuf> {
    static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

    ensure_parent(path)?;
    let tmp = path.with_extension(format!(
        "json.tmp-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let file = File::create(&tmp).map_err(|e| write_error(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    let written = writer
        .write_all(contents.as_bytes())
        .and_then(|_| writer.flush());
    drop(writer);

    match written {
        Ok(()) => Ok(tmp),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(write_error(&tmp, e))
        }
    }
}

/// Write through a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = write_temp(path, contents)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        write_error(path, e)
    })
}

fn read_raw(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TollgateError::Persistence(format!(
            "Failed to open file '{}': {}",
            path.display(),
            e
        ))),
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(raw) = read_raw(path)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw).map(Some).map_err(|e| {
        TollgateError::Persistence(format!("Failed to parse '{}': {}", path.display(), e))
    })
}
