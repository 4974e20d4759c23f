//! Ride analytics query explorer.
//!
//! Named SQL templates are loaded from a catalog file, filter selections
//! are translated into bound predicates, spliced into the template, and run
//! against an interchangeable backend.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod explorer;
pub mod filters;
pub mod splice;
pub mod types;
pub mod value_cache;

pub use catalog::{NamedQuery, QueryCatalog};
pub use error::{AnalyticsError, AnalyticsResult};
pub use explorer::{Explorer, FilterOptions, FinalQuery};
pub use filters::FilterSelection;
