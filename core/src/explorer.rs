//! The request path: named template → filters → spliced SQL → rows.
//!
//! Each request is independent. Nothing here is mutated by running a query.

use crate::{
    backend::QueryBackend,
    catalog::QueryCatalog,
    error::{AnalyticsError, AnalyticsResult},
    filters::{CancelSource, FilterSelection, DROPDOWN_COLUMNS, PAYMENT_METHOD, STATUS_OPTIONS, VEHICLE_OPTIONS},
    splice::splice_predicates,
    types::{Params, QueryResult},
    value_cache::DistinctValueCache,
};
use serde::Serialize;

/// Final SQL plus every parameter it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalQuery {
    pub sql:    String,
    pub params: Params,
}

impl FinalQuery {
    /// Splice `filters` into `base_sql`.
    pub fn build(base_sql: &str, filters: &FilterSelection) -> AnalyticsResult<Self> {
        let predicates = filters.translate()?;
        let sql = splice_predicates(base_sql, &predicates.condition());
        Ok(Self { sql, params: predicates.into_params() })
    }
}

/// Choices offered by the filter panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub statuses:       Vec<String>,
    pub vehicles:       Vec<String>,
    pub payments:       Vec<String>,
    pub cancel_sources: Vec<String>,
}

pub struct Explorer {
    catalog: QueryCatalog,
    backend: Box<dyn QueryBackend>,
    values:  DistinctValueCache,
}

impl Explorer {
    pub fn new(catalog: QueryCatalog, backend: Box<dyn QueryBackend>, values: DistinctValueCache) -> Self {
        Self { catalog, backend, values }
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> &dyn QueryBackend {
        self.backend.as_ref()
    }

    /// Build the final query for `name` without running it.
    pub fn prepare(&self, name: &str, filters: &FilterSelection) -> AnalyticsResult<FinalQuery> {
        let named = self.catalog.get(name)?;
        let query = FinalQuery::build(&named.sql, filters)?;
        log::debug!("prepared '{name}': {} params: {}", query.sql, query.params.len());
        Ok(query)
    }

    /// Build and execute. Either every row comes back or the error does.
    pub fn run(&self, name: &str, filters: &FilterSelection) -> AnalyticsResult<QueryResult> {
        let query = self.prepare(name, filters)?;
        self.execute(&query)
    }

    pub fn execute(&self, query: &FinalQuery) -> AnalyticsResult<QueryResult> {
        self.backend.execute(&query.sql, &query.params)
    }

    /// Dropdown choices for one of the allowed filter columns.
    pub fn dropdown_values(&self, column: &str) -> AnalyticsResult<Vec<String>> {
        if !DROPDOWN_COLUMNS.contains(&column) {
            return Err(AnalyticsError::InvalidColumn { column: column.to_string() });
        }
        self.values.distinct_values(self.backend.as_ref(), column)
    }

    /// Status and vehicle lists are fixed; payment methods come from the data.
    pub fn filter_options(&self) -> AnalyticsResult<FilterOptions> {
        Ok(FilterOptions {
            statuses: STATUS_OPTIONS.iter().map(|s| s.to_string()).collect(),
            vehicles: VEHICLE_OPTIONS.iter().map(|s| s.to_string()).collect(),
            payments: self.dropdown_values(PAYMENT_METHOD)?,
            cancel_sources: CancelSource::ALL.iter().map(|c| c.label().to_string()).collect(),
        })
    }
}
