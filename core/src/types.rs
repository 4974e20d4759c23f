//! Shared value types passed between the translator, splicer and backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value bound to a `:name` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Real(v)    => write!(f, "{v:?}"),
            ParamValue::Text(v)    => write!(f, "'{v}'"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self { ParamValue::Text(v.to_string()) }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self { ParamValue::Text(v) }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self { ParamValue::Real(v) }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self { ParamValue::Integer(v) }
}

/// Parameter names (without the leading colon) to bound values.
/// Ordered so previews and logs are stable.
pub type Params = BTreeMap<String, ParamValue>;

/// One cell of a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Render for dropdowns and text tables. Reals keep a fractional
    /// part (`4.0`, not `4`).
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null       => String::new(),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Real(v)    => format!("{v:?}"),
            CellValue::Text(v)    => v.clone(),
            CellValue::Blob(v)    => format!("<{} bytes>", v.len()),
        }
    }
}

/// Tabular result: named columns in select order, rows in backend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows:    Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}
