//! Spatially indexed catalog store over PostgreSQL/PostGIS.

pub mod catalog;
pub mod filter;

pub use catalog::{Catalog, UpsertOutcome};
pub use filter::{ItemFilter, PropertyPredicate, TemporalFilter};
