//! Quality checker and fingerprint benchmarks.
//!
//! Measures rule evaluation and hashing over generated order-item datasets.

use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use tollgate::{Column, Dataset, Fingerprinter, Parser, QualityChecker, ReportStore, RuleRegistry};

/// Generate an order-items dataset with a few out-of-range prices.
fn generate_order_items(rows: usize) -> Dataset {
    let order_ids = (0..rows).map(|i| Some(format!("order_{:08}", i)));
    let product_ids = (0..rows).map(|i| Some(format!("product_{}", i % 97)));
    let prices = (0..rows).map(|i| {
        if i % 500 == 0 {
            Some(-1.0)
        } else {
            Some((i % 2_000) as f64 * 1.25)
        }
    });
    let freight = (0..rows).map(|i| if i % 50 == 0 { None } else { Some((i % 90) as f64) });

    Dataset::from_columns([
        ("order_id", Column::strings(order_ids)),
        ("product_id", Column::strings(product_ids)),
        ("price", Column::floats(prices)),
        ("freight_value", Column::floats(freight)),
    ])
    .unwrap()
}

/// Generate CSV text for an orders dataset with timestamp strings.
fn generate_orders_csv(rows: usize) -> String {
    let mut data = String::from("order_id,customer_id,order_status,order_purchase_timestamp\n");
    for i in 0..rows {
        data.push_str(&format!(
            "o{},c{},delivered,2023-{:02}-{:02} 10:{:02}:00\n",
            i,
            i % 1_000,
            i % 12 + 1,
            i % 28 + 1,
            i % 60
        ));
    }
    data
}

/// Benchmark rule evaluation without persistence.
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_order_items");
    let dir = TempDir::new().unwrap();
    let checker = QualityChecker::new(
        Arc::new(RuleRegistry::ecommerce_defaults()),
        Arc::new(ReportStore::open(dir.path())),
    );
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    for rows in [1_000, 10_000, 100_000].iter() {
        let ds = generate_order_items(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &ds, |b, ds| {
            b.iter(|| black_box(checker.evaluate(ds, "order_items", now).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark date coercion on text timestamp columns.
fn bench_evaluate_dates(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_orders_dates");
    let dir = TempDir::new().unwrap();
    let checker = QualityChecker::new(
        Arc::new(RuleRegistry::ecommerce_defaults()),
        Arc::new(ReportStore::open(dir.path())),
    );
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    for rows in [1_000, 10_000].iter() {
        let ds = Parser::new()
            .parse_bytes(generate_orders_csv(*rows).as_bytes())
            .unwrap();
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &ds, |b, ds| {
            b.iter(|| black_box(checker.evaluate(ds, "orders", now).unwrap()))
        });
    }

    group.finish();
}

/// Compare the layout fingerprint with the full content hash.
fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    let ds = generate_order_items(100_000);

    group.bench_function("fingerprint", |b| {
        b.iter(|| black_box(Fingerprinter::compute(&ds)))
    });
    group.bench_function("content_hash", |b| {
        b.iter(|| black_box(Fingerprinter::content_hash(&ds)))
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_evaluate_dates, bench_hashing);
criterion_main!(benches);
