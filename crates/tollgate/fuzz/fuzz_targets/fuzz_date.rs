//! Fuzz target for date parsing and date checks.
//!
//! Arbitrary text in a date column must yield either a coerced column or a
//! parse-error issue, never a panic.

#![no_main]

use std::sync::Arc;

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use tollgate::input::temporal;
use tollgate::{Column, Dataset, QualityChecker, ReportStore, RuleRegistry, RuleSet};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    let _ = temporal::looks_like_date(content);
    let _ = temporal::parse_datetime(content);

    let Ok(ds) = Dataset::from_columns([(
        "d",
        Column::strings(content.lines().map(Some)),
    )]) else {
        return;
    };
    let Ok(registry) = RuleRegistry::new([("t", RuleSet::new().with_dates(["d"]))]) else {
        return;
    };
    let checker = QualityChecker::new(
        Arc::new(registry),
        Arc::new(ReportStore::open(std::env::temp_dir().join("tollgate-fuzz"))),
    );
    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let _ = checker.evaluate(&ds, "t", now);
});
