//! STAC protocol types and utilities.
//!
//! Document types for the SpatioTemporal Asset Catalog specification
//! (Items, Collections, landing page, conformance) plus item-search
//! request parsing. Pure data, no I/O.

pub mod collection;
pub mod geometry;
pub mod item;
pub mod responses;
pub mod search;
pub mod types;

pub use collection::Collection;
pub use geometry::Geometry;
pub use item::{Asset, Item, ItemTemporal, PropertyValue};
pub use responses::{
    conformance, ConformanceClasses, ExceptionResponse, ItemCollection, LandingPage,
};
pub use search::{PropertyFilter, PropertyOp, SearchRequest};
pub use types::{Extent, Link, Provider, SpatialExtent, TemporalExtent};

/// STAC specification version implemented by this catalog.
pub const STAC_VERSION: &str = "1.0.0";
