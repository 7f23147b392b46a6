//! End-to-end tests through the public API.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use indexmap::IndexMap;
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};

use tollgate::{
    Category, Column, Dataset, Fingerprinter, IssueKind, LineageTracker, MetadataRecorder,
    QualityChecker, QualityReport, ReportStore, RuleRegistry, Tollgate, TollgateConfig,
    TollgateError,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn gate(dir: &TempDir) -> Tollgate {
    Tollgate::with_config(
        RuleRegistry::ecommerce_defaults(),
        TollgateConfig::default().with_log_dir(dir.path()),
    )
}

// =============================================================================
// Quality checks
// =============================================================================

#[test]
fn test_orders_with_one_null_customer() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let file = create_test_file(
        "order_id,customer_id,order_status,order_purchase_timestamp\n\
         o1,c1,delivered,2023-10-02 10:56:33\n\
         o2,c2,delivered,2023-10-03 11:00:00\n\
         o3,,shipped,2023-10-04 09:12:45\n\
         o4,c4,delivered,2023-10-05 18:30:00\n\
         o5,c5,canceled,2023-10-06 08:00:00\n",
        ".csv",
    );

    let orders = gate.load(file.path()).unwrap();
    let report = gate.check(&orders, "orders").unwrap();

    assert_eq!(report.messages(), vec!["Found 1 null values in customer_id"]);
    assert!(!report.passed());
    assert_eq!(report.total_rows(), 5);

    let keys = gate.store().list(Category::QualityReport, "orders").unwrap();
    assert_eq!(keys.len(), 1);
    let path = gate.store().path_for(&keys[0]);
    assert!(path.starts_with(dir.path().join("data_quality_reports")));
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("quality_report_orders_"));

    let stored: QualityReport = gate.store().load(&keys[0]).unwrap().unwrap();
    assert_eq!(stored, report);
}

#[test]
fn test_order_items_price_range() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let file = create_test_file(
        "order_id\tproduct_id\tprice\tfreight_value\n\
         o1\tp1\t-5\t10.5\n\
         o2\tp2\t100\t3.2\n\
         o3\tp3\t9999\t0\n\
         o4\tp4\t10001\t1000\n",
        ".tsv",
    );

    let items = gate.load(file.path()).unwrap();
    let report = gate.check(&items, "order_items").unwrap();

    let ranges: Vec<_> = report.issues_of(IssueKind::RangeViolation).collect();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].column.as_deref(), Some("price"));
    assert_eq!(ranges[0].count, Some(2));
    assert_eq!(
        ranges[0].message,
        "Found 2 values outside range (0, 10000) in price"
    );
    assert_eq!(report.issues().len(), 1);
}

#[test]
fn test_clean_dataset_passes() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let customers = Dataset::from_columns([
        ("customer_id", Column::strings([Some("c1"), Some("c2")])),
        ("customer_city", Column::strings([Some("campinas"), Some("santos")])),
        ("customer_state", Column::strings([Some("SP"), Some("SP")])),
    ])
    .unwrap();

    let report = gate.check(&customers, "customers").unwrap();
    assert!(report.passed());
    assert!(report.issues().is_empty());
}

#[test]
fn test_unregistered_dataset_is_an_error() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let err = gate.check(&Dataset::new(), "payments").unwrap_err();
    assert!(matches!(err, TollgateError::UnknownDataset(_)));
    assert!(gate
        .store()
        .list(Category::QualityReport, "payments")
        .unwrap()
        .is_empty());
}

#[test]
fn test_rules_from_file() {
    let dir = TempDir::new().unwrap();
    let rules = create_test_file(
        r#"{
            "payments": {
                "required_columns": ["payment_id", "amount"],
                "unique_columns": ["payment_id"],
                "numeric_ranges": {"amount": [0, 500]}
            }
        }"#,
        ".json",
    );
    let registry = RuleRegistry::from_json_file(rules.path()).unwrap();
    let checker = QualityChecker::new(
        Arc::new(registry),
        Arc::new(ReportStore::open(dir.path())),
    );

    let payments = Dataset::from_columns([
        ("payment_id", Column::integers([Some(1), Some(1), Some(2)])),
        ("amount", Column::floats([Some(10.0), Some(600.0), None])),
    ])
    .unwrap();
    let report = checker.check(&payments, "payments").unwrap();

    assert_eq!(
        report.messages(),
        vec![
            "Found 1 duplicate values in payment_id",
            "Found 1 values outside range (0, 500) in amount",
        ]
    );
}

// =============================================================================
// Metadata and lineage
// =============================================================================

#[test]
fn test_fingerprint_ignores_cell_values() {
    let a = Dataset::from_columns([("x", Column::integers([Some(1), Some(2)]))]).unwrap();
    let b = Dataset::from_columns([("x", Column::integers([Some(99), None]))]).unwrap();

    assert_eq!(Fingerprinter::compute(&a), Fingerprinter::compute(&b));
    assert_ne!(Fingerprinter::content_hash(&a), Fingerprinter::content_hash(&b));
}

#[test]
fn test_track_in_same_second_keeps_every_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ReportStore::open(dir.path()));
    let recorder = MetadataRecorder::new(Arc::clone(&store));
    let ds = Dataset::from_columns([("id", Column::integers([Some(1)]))]).unwrap();

    for _ in 0..5 {
        recorder.track(&ds, "orders", "raw").unwrap();
    }

    assert_eq!(store.list(Category::Metadata, "orders").unwrap().len(), 5);
    assert_eq!(store.list(Category::Lineage, "orders").unwrap().len(), 5);
}

#[test]
fn test_track_does_not_touch_transformation_logs() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let ds = Dataset::from_columns([("id", Column::integers([Some(1)]))]).unwrap();

    gate.log_transformation("orders", "sales", "merge", IndexMap::new())
        .unwrap();
    gate.track(&ds, "sales", "merged").unwrap();

    let view = gate.lineage_of("sales").unwrap();
    assert_eq!(view.stages.len(), 1);
    assert!(view.stages[0].transformations.is_empty());
    assert!(view.stages[0].source_datasets.is_empty());
    assert_eq!(view.incoming.len(), 1);
    assert_eq!(view.upstream(), vec!["orders"]);
}

#[test]
fn test_concurrent_transformation_logging_loses_nothing() {
    let dir = TempDir::new().unwrap();
    let tracker = Arc::new(LineageTracker::new(Arc::new(ReportStore::open(dir.path()))));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for step in 0..10 {
                    let mut details = IndexMap::new();
                    details.insert("worker".to_string(), json!(worker));
                    details.insert("step".to_string(), json!(step));
                    tracker
                        .log_transformation("orders,order_items", "sales", "merge", details)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let log = tracker.transformations("orders,order_items", "sales").unwrap();
    assert_eq!(log.len(), 80);
    for worker in 0..8 {
        let steps: Vec<_> = log
            .iter()
            .filter(|e| e.transformation_details["worker"] == json!(worker))
            .map(|e| e.transformation_details["step"].clone())
            .collect();
        assert_eq!(steps, (0..10).map(|s| json!(s)).collect::<Vec<_>>());
    }
}

#[test]
fn test_ingest_pipeline() {
    let dir = TempDir::new().unwrap();
    let gate = gate(&dir);
    let good = create_test_file(
        "customer_id,customer_city,customer_state\nc1,recife,PE\nc2,natal,RN\n",
        ".csv",
    );
    let bad = create_test_file(
        "customer_id,customer_city\nc1,recife\n",
        ".csv",
    );

    let accepted = gate
        .ingest(&gate.load(good.path()).unwrap(), "customers", "raw")
        .unwrap();
    assert!(accepted.is_accepted());

    let rejected = gate
        .ingest(&gate.load(bad.path()).unwrap(), "customers", "raw")
        .unwrap();
    assert_eq!(
        rejected.report().messages(),
        vec!["Missing required columns: customer_state"]
    );

    let view = gate.lineage_of("customers").unwrap();
    assert_eq!(view.stages.len(), 1);
    assert_eq!(view.stages[0].row_count, 2);
}
