//! Date/time recognition and coercion.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

use super::dataset::{Column, ColumnType, Value};

// Cheap shape test before trying every chrono format.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}").unwrap(), // ISO date
        Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}").unwrap(), // Alt ISO
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}").unwrap(), // US date
    ]
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Returns true if the value has the shape of a date.
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    DATE_PATTERNS.iter().any(|p| p.is_match(trimmed))
}

/// Parse a date or date-time string as local wall-clock time.
///
/// Timestamps carrying an offset are converted to the local time zone, the
/// same frame as [`crate::store::now_local`]; date-only values resolve to
/// midnight.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    parse_datetime_in(value, &Local)
}

/// Parse a date or date-time string as wall-clock time in `tz`.
///
/// Values without an offset are taken as already being in `tz`.
pub fn parse_datetime_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if !looks_like_date(trimmed) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(tz).naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a column to [`ColumnType::DateTime`].
///
/// Returns `Ok(None)` when the column is already temporal. Fails with a
/// description of the first unparseable cell; nulls are carried over.
pub fn coerce_to_datetime(column: &Column) -> std::result::Result<Option<Column>, String> {
    match column.dtype() {
        ColumnType::DateTime => return Ok(None),
        ColumnType::String => {}
        // All-null columns of any type coerce trivially.
        _ if column.null_count() == column.len() => {}
        other => {
            return Err(format!("cannot interpret {} values as dates", other));
        }
    }

    let mut converted = Vec::with_capacity(column.len());
    for (row, value) in column.values().iter().enumerate() {
        if value.is_null() {
            converted.push(Value::Null);
            continue;
        }
        let Some(text) = value.as_str() else {
            return Err(format!("non-text value '{}' at row {}", value, row));
        };
        match parse_datetime(text) {
            Some(dt) => converted.push(Value::DateTime(dt)),
            None => {
                return Err(format!("unknown datetime format '{}' at row {}", text, row));
            }
        }
    }

    Ok(Some(Column::new(ColumnType::DateTime, converted)))
}
