//! Ahti Export Library - Candidate Feature Assembly for Debug GeoJSON
//!
//! This library turns the heterogeneous candidate tables of the Ahti staging database
//! (rivers, lakes, virtual connectors, debug terminals, paddling segments and traced routes)
//! into a single GeoJSON `FeatureCollection` that the visual debugging tools can overlay on a
//! map.
//!
//! # Architecture
//!
//! - **[`SourceQuery`]**: One declarative, reprojecting query per feature class
//! - **[`mapper`]**: Pure row → properties functions, one per schema variant and class
//! - **[`LayerMerger`]**: Stable concatenation in render (z) order
//! - **[`CollectionBuilder`]**: Always-valid `FeatureCollection` plus export statistics
//! - **[`Exporter`]**: The one-shot pipeline, parameterized by a [`SchemaVariant`]
//!
//! Sources are abstracted behind [`FeatureSource`], so a pipeline can be driven by PostGIS
//! ([`PgSource`], feature `postgis`) or by in-memory fixture rows ([`MemorySource`]).

mod collection;
mod config;
pub mod crs;
pub mod mapper;
mod merge;
mod pipeline;
#[cfg(feature = "postgis")]
mod postgis;
mod row;
mod schema;
mod source;

// Public API exports
pub use collection::{CollectionBuilder, ExportInfo, ExportedCollection};
pub use config::{DatabaseConfig, ExportConfig};
pub use merge::{LayerCount, LayerMerger};
pub use pipeline::Exporter;
#[cfg(feature = "postgis")]
pub use postgis::PgSource;
pub use row::{FeatureClass, RawRow};
pub use schema::{LayerSpec, SchemaVariant};
pub use source::{FeatureSource, MemorySource, Relation, Selector, SourceQuery, StoredRow};

/// Error types for the export pipeline
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[cfg(feature = "postgis")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to start database runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Geometry of {class} row is not in WGS84 lon/lat: {reason}")]
    NotGeographic { class: FeatureClass, reason: String },

    #[error("Source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;
