//! Dataset model and delimited-text ingestion.

mod dataset;
mod parser;
pub mod temporal;

pub use dataset::{Column, ColumnType, Dataset, Value};
pub use parser::{is_null_value, Parser, ParserConfig};
