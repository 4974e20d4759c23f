//! Query execution backends.
//!
//! RULE: backends are interchangeable. The explorer only sees
//! `QueryBackend::execute`; it never knows whether rows came from a
//! database file or a CSV materialized in memory.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{CellValue, ParamValue, Params, QueryResult},
};
use rusqlite::{
    types::{ToSqlOutput, ValueRef},
    Connection, ToSql,
};

mod flat_file;
mod sqlite_file;

pub use flat_file::CsvBackend;
pub use sqlite_file::SqliteBackend;

/// Run parameterized SQL and return every row.
///
/// Implementations acquire whatever connection they need for the call and
/// release it before returning. All failures are reported as
/// `AnalyticsError::QueryExecution` with the backend's message.
pub trait QueryBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn execute(&self, sql: &str, params: &Params) -> AnalyticsResult<QueryResult>;
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ParamValue::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            ParamValue::Real(v)    => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            ParamValue::Text(v)    => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

/// Prepare `sql` on `conn`, bind its `:name` placeholders from `params` and
/// collect the full result. Params the statement does not mention are
/// ignored; placeholders without a value are an error.
pub(crate) fn run_statement(conn: &Connection, sql: &str, params: &Params) -> AnalyticsResult<QueryResult> {
    let mut stmt = conn.prepare(sql).map_err(AnalyticsError::execution)?;

    let mut bindings: Vec<(String, &ParamValue)> = Vec::with_capacity(stmt.parameter_count());
    for idx in 1..=stmt.parameter_count() {
        let placeholder = stmt.parameter_name(idx).ok_or_else(|| AnalyticsError::QueryExecution {
            message: format!("positional parameter at index {idx} is not supported; use :name placeholders"),
        })?;
        let key = placeholder.trim_start_matches([':', '@', '$']);
        let value = params.get(key).ok_or_else(|| AnalyticsError::QueryExecution {
            message: format!("no value bound for parameter {placeholder}"),
        })?;
        bindings.push((placeholder.to_string(), value));
    }
    let named: Vec<(&str, &dyn ToSql)> = bindings
        .iter()
        .map(|(name, value)| (name.as_str(), *value as &dyn ToSql))
        .collect();

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

    let mut rows_iter = stmt.query(named.as_slice()).map_err(AnalyticsError::execution)?;
    let mut rows = Vec::new();
    while let Some(row) = rows_iter.next().map_err(AnalyticsError::execution)? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value = row.get_ref(idx).map_err(AnalyticsError::execution)?;
            values.push(cell_from_sqlite(value));
        }
        rows.push(values);
    }

    Ok(QueryResult { columns, rows })
}

fn cell_from_sqlite(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null       => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Integer(v),
        ValueRef::Real(v)    => CellValue::Real(v),
        ValueRef::Text(v)    => CellValue::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v)    => CellValue::Blob(v.to_vec()),
    }
}
