use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Query catalog not found: {path}")]
    CatalogNotFound { path: String },

    #[error("No named queries found in {path}; each query must start with `-- name:` and have SQL below it")]
    EmptyCatalog { path: String },

    #[error("Query '{name}' not found in catalog")]
    QueryNotFound { name: String },

    #[error("Query failed: {message}")]
    QueryExecution { message: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("'{column}' is not an allowed dropdown column")]
    InvalidColumn { column: String },

    #[error("Parameter ':{name}' bound more than once")]
    DuplicateParam { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalyticsError {
    /// Wrap a backend diagnostic without losing its text.
    pub fn execution(err: impl std::fmt::Display) -> Self {
        AnalyticsError::QueryExecution { message: err.to_string() }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
