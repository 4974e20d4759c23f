//! Distinct-value lookups for filter dropdowns, cached per column.
//!
//! The cache is owned by whoever drives the UI. Entries expire `ttl` after
//! they were written and are then recomputed on the next lookup. Concurrent
//! misses on the same column share one backend query.

use crate::{
    backend::QueryBackend,
    error::{AnalyticsError, AnalyticsResult},
    types::Params,
};
use moka::sync::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex")
});

pub struct DistinctValueCache {
    table:   String,
    ttl:     Duration,
    entries: Cache<String, Vec<String>>,
}

impl DistinctValueCache {
    pub fn new(table: impl Into<String>, ttl: Duration) -> Self {
        Self {
            table: table.into(),
            ttl,
            entries: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn distinct_values(&self, backend: &dyn QueryBackend, column: &str) -> AnalyticsResult<Vec<String>> {
        for ident in [column, self.table.as_str()] {
            if !IDENT_RE.is_match(ident) {
                return Err(AnalyticsError::InvalidColumn { column: ident.to_string() });
            }
        }

        // Failed fetches are not stored.
        self.entries
            .try_get_with(column.to_string(), || {
                log::debug!("distinct values for {column}: cache miss, querying {}", backend.name());
                self.fetch(backend, column)
            })
            .map_err(|shared| {
                Arc::try_unwrap(shared).unwrap_or_else(|shared| AnalyticsError::QueryExecution {
                    message: shared.to_string(),
                })
            })
    }

    fn fetch(&self, backend: &dyn QueryBackend, column: &str) -> AnalyticsResult<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {column} AS val FROM {table} WHERE {column} IS NOT NULL ORDER BY val;",
            table = self.table,
        );
        let result = backend.execute(&sql, &Params::new())?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .filter(|cell| !cell.is_null())
            .map(|cell| cell.to_display_string())
            .collect())
    }

    pub fn invalidate(&self, column: &str) {
        self.entries.invalidate(column);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Number of live entries.
    pub fn cached_columns(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }
}
