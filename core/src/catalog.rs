//! Named query catalog.
//!
//! A catalog file is plain SQL where each query is introduced by a marker
//! line:
//!
//! ```text
//! -- name: Successful bookings
//! SELECT * FROM ola_clean
//! WHERE Booking_Status = 'Success'
//! ```
//!
//! Non-blank lines after a marker belong to it until the next marker or EOF.
//! Markers without SQL produce no entry.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::Serialize;
use std::path::Path;

const MARKER: &str = "-- name:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedQuery {
    pub name: String,
    pub sql:  String,
}

/// Named queries in the order they first appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCatalog {
    queries: Vec<NamedQuery>,
}

enum ParserState {
    Outside,
    Inside { name: String, lines: Vec<String> },
}

impl QueryCatalog {
    /// Load and parse the catalog at `path`.
    pub fn load(path: impl AsRef<Path>) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AnalyticsError::CatalogNotFound { path: display.clone() },
            _ => AnalyticsError::Io(e),
        })?;

        let catalog = Self::parse(&text);
        if catalog.is_empty() {
            return Err(AnalyticsError::EmptyCatalog { path: display });
        }
        log::debug!("loaded {} named queries from {display}", catalog.len());
        Ok(catalog)
    }

    /// Parse catalog text. Never fails; an empty catalog is returned when
    /// no marker carries SQL.
    pub fn parse(text: &str) -> Self {
        let mut catalog = QueryCatalog::default();
        let mut state = ParserState::Outside;

        for line in text.split_inclusive('\n') {
            let stripped = line.trim();

            if let Some(name) = marker_label(stripped) {
                if let ParserState::Inside { name: prev, lines } = state {
                    catalog.flush(prev, &lines);
                }
                state = ParserState::Inside { name, lines: Vec::new() };
                continue;
            }

            if let ParserState::Inside { lines, .. } = &mut state {
                if !stripped.is_empty() {
                    lines.push(line.to_string());
                }
            }
        }

        if let ParserState::Inside { name, lines } = state {
            catalog.flush(name, &lines);
        }
        catalog
    }

    fn flush(&mut self, name: String, lines: &[String]) {
        if name.is_empty() || lines.is_empty() {
            return;
        }
        let sql = lines.concat().trim().to_string();
        match self.queries.iter_mut().find(|q| q.name == name) {
            Some(existing) => {
                log::warn!("query '{name}' defined more than once; keeping the last definition");
                existing.sql = sql;
            }
            None => self.queries.push(NamedQuery { name, sql }),
        }
    }

    pub fn get(&self, name: &str) -> AnalyticsResult<&NamedQuery> {
        self.queries
            .iter()
            .find(|q| q.name == name)
            .ok_or_else(|| AnalyticsError::QueryNotFound { name: name.to_string() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedQuery> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize { self.queries.len() }

    pub fn is_empty(&self) -> bool { self.queries.is_empty() }
}

/// Returns the label if `line` (already trimmed) is a `-- name:` marker.
fn marker_label(line: &str) -> Option<String> {
    let prefix = line.get(..MARKER.len())?;
    if !prefix.eq_ignore_ascii_case(MARKER) {
        return None;
    }
    let label = line.split_once(':').map(|(_, rest)| rest.trim()).unwrap_or_default();
    Some(label.to_string())
}
