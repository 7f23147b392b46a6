//! CSV/TSV loader with delimiter detection and column type inference.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, TollgateError};
use super::dataset::{Column, ColumnType, Dataset, Value};
use super::temporal;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
    /// Load date-shaped text columns as [`ColumnType::DateTime`].
    ///
    /// Off by default: date columns are normally coerced by the quality
    /// checker, which reports parse failures as issues.
    pub infer_dates: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
            infer_dates: false,
        }
    }
}

/// Loads delimited text into a [`Dataset`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file into a dataset.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| TollgateError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let dataset = self.parse_bytes(&contents)?;
        tracing::debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse in-memory bytes into a dataset.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Dataset> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TollgateError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); expected_cols];

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            for (col_idx, column) in cells.iter_mut().enumerate() {
                // Short rows are padded with empty (null) cells, extra cells dropped.
                column.push(record.get(col_idx).unwrap_or("").to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| {
                let column = self.build_column(&raw);
                (name, column)
            })
            .collect::<Vec<_>>();

        Dataset::from_columns(columns)
    }

    /// Infer a column type from its raw cells and convert them.
    fn build_column(&self, raw: &[String]) -> Column {
        let present: Vec<&str> = raw
            .iter()
            .map(|s| s.trim())
            .filter(|s| !is_null_value(s))
            .collect();

        let dtype = infer_type(&present, self.config.infer_dates);
        let values = raw
            .iter()
            .map(|s| convert(s.trim(), dtype))
            .collect();
        Column::new(dtype, values)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a value represents a missing/null value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Pick the narrowest type every present value fits.
fn infer_type(present: &[&str], infer_dates: bool) -> ColumnType {
    if present.is_empty() {
        return ColumnType::String;
    }
    if present.iter().all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.iter().all(|v| v.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if present.iter().all(|v| parse_bool(v).is_some()) {
        ColumnType::Boolean
    } else if infer_dates && present.iter().all(|v| temporal::parse_datetime(v).is_some()) {
        ColumnType::DateTime
    } else {
        ColumnType::String
    }
}

fn convert(value: &str, dtype: ColumnType) -> Value {
    if is_null_value(value) {
        return Value::Null;
    }
    // Types were inferred from these same cells, so each parse succeeds.
    match dtype {
        ColumnType::Integer => value.parse().map(Value::Integer).unwrap_or(Value::Null),
        ColumnType::Float => value.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnType::Boolean => parse_bool(value).map(Value::Boolean).unwrap_or(Value::Null),
        ColumnType::DateTime => temporal::parse_datetime(value)
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        ColumnType::String => Value::String(value.to_string()),
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(TollgateError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Score: higher count with lower variance is better
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
