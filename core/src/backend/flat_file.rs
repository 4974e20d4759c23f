use super::{run_statement, QueryBackend};
use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{Params, QueryResult},
};
use rusqlite::{params_from_iter, types::Value, Connection};
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLE: &str = "ola_clean";

/// Local substitute backend: each call loads the CSV export into a fresh
/// in-memory SQLite database and runs the query there.
#[derive(Debug, Clone)]
pub struct CsvBackend {
    path:  PathBuf,
    table: String,
}

impl CsvBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_table(path, DEFAULT_TABLE)
    }

    pub fn with_table(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self { path: path.into(), table: table.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build the ephemeral store. Column names come from the CSV header;
    /// each cell is stored with its inferred type.
    fn materialize(&self) -> AnalyticsResult<Connection> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| AnalyticsError::QueryExecution {
            message: format!("cannot read {}: {e}", self.path.display()),
        })?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(AnalyticsError::execution)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() {
            return Err(AnalyticsError::QueryExecution {
                message: format!("{} has no header row", self.path.display()),
            });
        }

        let mut conn = Connection::open_in_memory().map_err(AnalyticsError::execution)?;
        let column_list = headers.iter().map(|h| quote_ident(h)).collect::<Vec<_>>().join(", ");
        conn.execute_batch(&format!("CREATE TABLE {} ({column_list});", quote_ident(&self.table)))
            .map_err(AnalyticsError::execution)?;

        let placeholders = (1..=headers.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
        let insert = format!("INSERT INTO {} VALUES ({placeholders})", quote_ident(&self.table));

        let tx = conn.transaction().map_err(AnalyticsError::execution)?;
        let mut loaded = 0usize;
        {
            let mut stmt = tx.prepare(&insert).map_err(AnalyticsError::execution)?;
            for record in reader.records() {
                let record = record.map_err(AnalyticsError::execution)?;
                let values = (0..headers.len()).map(|i| infer_cell(record.get(i).unwrap_or("")));
                stmt.execute(params_from_iter(values)).map_err(AnalyticsError::execution)?;
                loaded += 1;
            }
        }
        tx.commit().map_err(AnalyticsError::execution)?;

        log::debug!("materialized {loaded} rows from {} into {}", self.path.display(), self.table);
        Ok(conn)
    }
}

impl QueryBackend for CsvBackend {
    fn name(&self) -> &'static str { "csv" }

    fn execute(&self, sql: &str, params: &Params) -> AnalyticsResult<QueryResult> {
        let conn = self.materialize()?;
        let result = run_statement(&conn, sql, params)?;
        log::info!("{} returned {} rows from {}", self.name(), result.len(), self.path.display());
        Ok(result)
    }
}

/// Empty → NULL, integer or real text → number, anything else → text.
fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Value::Integer(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Real(v),
        _ => Value::Text(raw.to_string()),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
