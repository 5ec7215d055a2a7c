//! Column values moved between rows and storage
//!
//! Staged loads are generic over the row type, so every row hands the loader
//! its column values as a `ColumnValue` list in schema order.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// A single typed column value
///
/// `Text` is also used for numeric source text that failed to parse, so the
/// database rejects that row during the insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(Option<String>),
    Decimal(Option<Decimal>),
    Int(Option<i32>),
    Timestamp(Option<NaiveDateTime>),
}

impl ColumnValue {
    /// Non-null text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Some(value.into()))
    }

    /// Text value stored as NULL when empty
    pub fn text_or_null(value: &str) -> Self {
        if value.is_empty() {
            Self::Text(None)
        } else {
            Self::Text(Some(value.to_string()))
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Text(v) => v.is_none(),
            Self::Decimal(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
        }
    }

    /// Value rendered for files and key strings; NULL renders empty
    pub fn render(&self) -> String {
        match self {
            Self::Text(v) => v.clone().unwrap_or_default(),
            Self::Decimal(v) => v.map(|d| d.normalize().to_string()).unwrap_or_default(),
            Self::Int(v) => v.map(|i| i.to_string()).unwrap_or_default(),
            Self::Timestamp(v) => v
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }

    /// SQL equality with `NULL = NULL` treated as equal
    pub fn same_as(&self, other: &ColumnValue) -> bool {
        match (self.is_null(), other.is_null()) {
            (true, true) => true,
            (false, false) => self == other,
            _ => false,
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A row that can be written through a staged load
pub trait StageRow: Serialize + Send + Sync {
    /// Column values in the order of the schema's field list
    fn column_values(&self) -> Vec<ColumnValue>;
}
