//! In-memory tabular dataset.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TollgateError};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Text values.
    String,
    /// Boolean values.
    Boolean,
    /// Date and time values.
    DateTime,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::DateTime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// A single cell.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    String(String),
}

impl Value {
    /// Null cells and float NaN both count as missing.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Heap bytes owned by the cell.
    fn heap_size(&self) -> usize {
        match self {
            Value::String(s) => s.capacity(),
            _ => 0,
        }
    }
}

/// Equality treats all nulls (including NaN) as equal to each other, so
/// duplicate detection groups missing cells together.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_null() && b.is_null() => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_null() {
            0u8.hash(state);
            return;
        }
        match self {
            Value::Integer(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            Value::Float(v) => {
                2u8.hash(state);
                canonical_bits(*v).hash(state);
            }
            Value::Boolean(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Value::DateTime(v) => {
                4u8.hash(state);
                v.hash(state);
            }
            Value::String(v) => {
                5u8.hash(state);
                v.hash(state);
            }
            Value::Null => unreachable!("nulls hashed above"),
        }
    }
}

/// Collapse `-0.0` onto `0.0` so they hash alike.
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) if v.is_nan() => f.write_str("null"),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A typed column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    dtype: ColumnType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column from raw cells.
    pub fn new(dtype: ColumnType, values: Vec<Value>) -> Self {
        Self { dtype, values }
    }

    pub fn integers(values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self::collect(ColumnType::Integer, values)
    }

    pub fn floats(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::collect(ColumnType::Float, values)
    }

    pub fn booleans(values: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self::collect(ColumnType::Boolean, values)
    }

    pub fn datetimes(values: impl IntoIterator<Item = Option<NaiveDateTime>>) -> Self {
        Self::collect(ColumnType::DateTime, values)
    }

    pub fn strings<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        Self::collect(
            ColumnType::String,
            values.into_iter().map(|v| v.map(Into::<String>::into)),
        )
    }

    fn collect<T: Into<Value>>(dtype: ColumnType, values: impl IntoIterator<Item = Option<T>>) -> Self {
        Self {
            dtype,
            values: values.into_iter().map(Value::from).collect(),
        }
    }

    pub fn dtype(&self) -> ColumnType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Number of distinct non-null values.
    pub fn unique_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of rows repeating a value already seen earlier in the column.
    pub fn duplicate_count(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.values.len());
        self.values.iter().filter(|v| !seen.insert(*v)).count()
    }

    /// Non-null numeric cells, in row order.
    pub fn numeric_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(Value::as_f64)
    }

    fn memory_estimate(&self) -> usize {
        self.values.len() * mem::size_of::<Value>()
            + self.values.iter().map(Value::heap_size).sum::<usize>()
    }
}

/// An ordered set of equally long named columns with a row index.
///
/// The index labels default to `0..n-1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: IndexMap<String, Column>,
    index: Vec<Value>,
}

impl Dataset {
    /// Create an empty dataset (no columns, no rows).
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a dataset from named columns.
    ///
    /// Fails if a name repeats or the columns differ in length.
    pub fn from_columns<N: Into<String>>(
        columns: impl IntoIterator<Item = (N, Column)>,
    ) -> Result<Self> {
        let mut map: IndexMap<String, Column> = IndexMap::new();
        let mut rows: Option<usize> = None;

        for (name, column) in columns {
            let name = name.into();
            match rows {
                Some(n) if n != column.len() => {
                    return Err(TollgateError::InvalidDataset(format!(
                        "column '{}' has {} rows, expected {}",
                        name,
                        column.len(),
                        n
                    )));
                }
                _ => rows = Some(column.len()),
            }
            if map.contains_key(&name) {
                return Err(TollgateError::InvalidDataset(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
            map.insert(name, column);
        }

        let index = (0..rows.unwrap_or(0) as i64).map(Value::Integer).collect();
        Ok(Self { columns: map, index })
    }

    /// Replace the default positional index with explicit labels.
    pub fn with_index(mut self, index: Vec<Value>) -> Result<Self> {
        if index.len() != self.row_count() {
            return Err(TollgateError::InvalidDataset(format!(
                "index has {} labels, expected {}",
                index.len(),
                self.row_count()
            )));
        }
        self.index = index;
        Ok(self)
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Named columns in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    /// Label of the first row, if any.
    pub fn first_index(&self) -> Option<&Value> {
        self.index.first()
    }

    /// Swap in a column of the same length, keeping its position.
    pub(crate) fn replace_column(&mut self, name: &str, column: Column) {
        debug_assert_eq!(column.len(), self.row_count());
        if let Some(slot) = self.columns.get_mut(name) {
            *slot = column;
        }
    }

    /// Approximate in-memory footprint in bytes, including index and names.
    pub fn memory_estimate(&self) -> usize {
        let index = self.index.len() * mem::size_of::<Value>()
            + self.index.iter().map(Value::heap_size).sum::<usize>();
        let columns: usize = self
            .columns
            .iter()
            .map(|(name, col)| name.capacity() + col.memory_estimate())
            .sum();
        index + columns
    }
}
