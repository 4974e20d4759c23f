use crate::{
    backend::{CsvBackend, QueryBackend, SqliteBackend},
    value_cache::DistinctValueCache,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where rows come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Sqlite {
        path: PathBuf,
    },
    Csv {
        path: PathBuf,
        #[serde(default)]
        table: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite { path: PathBuf::from("ola_ride.db") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path:   PathBuf,
    pub backend:        BackendConfig,
    /// Table the dropdown lookups read from.
    pub source_table:   String,
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path:   PathBuf::from("ola_sql_queries.sql"),
            backend:        BackendConfig::default(),
            source_table:   "ola_clean".into(),
            cache_ttl_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))?;
        Ok(config)
    }

    /// Config pointing at a CSV fixture, for tests.
    pub fn default_test(csv_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            backend: BackendConfig::Csv { path: csv_path.into(), table: None },
            cache_ttl_secs: 60,
            ..Self::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Table both the backend and the dropdown lookups read from. A CSV
    /// backend's own `table` wins over `source_table`.
    pub fn table_name(&self) -> &str {
        match &self.backend {
            BackendConfig::Csv { table: Some(table), .. } => table,
            _ => &self.source_table,
        }
    }

    pub fn build_backend(&self) -> Box<dyn QueryBackend> {
        match &self.backend {
            BackendConfig::Sqlite { path } => Box::new(SqliteBackend::new(path.clone())),
            BackendConfig::Csv { path, .. } => {
                Box::new(CsvBackend::with_table(path.clone(), self.table_name()))
            }
        }
    }

    pub fn build_value_cache(&self) -> DistinctValueCache {
        DistinctValueCache::new(self.table_name(), self.cache_ttl())
    }
}
