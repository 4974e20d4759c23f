use super::{run_statement, QueryBackend};
use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{Params, QueryResult},
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Live database backend: a SQLite file holding the cleaned bookings table.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    path: PathBuf,
}

impl SqliteBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One read-only connection per call. The file must already exist.
    fn connect(&self) -> AnalyticsResult<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| AnalyticsError::QueryExecution {
            message: format!("cannot open {}: {e}", self.path.display()),
        })
    }
}

impl QueryBackend for SqliteBackend {
    fn name(&self) -> &'static str { "sqlite" }

    fn execute(&self, sql: &str, params: &Params) -> AnalyticsResult<QueryResult> {
        let conn = self.connect()?;
        let result = run_statement(&conn, sql, params)?;
        log::info!("{} returned {} rows from {}", self.name(), result.len(), self.path.display());
        Ok(result)
    }
}
