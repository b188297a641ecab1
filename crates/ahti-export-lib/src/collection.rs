//! ExportedCollection - the finished, always-valid FeatureCollection
//!
//! The builder is the last in-memory stage: it wraps the merged features as a GeoJSON
//! `FeatureCollection` and summarizes the run. It performs no I/O; persisting the collection is
//! up to the caller.

use crate::crs::GeoBounds;
use crate::{LayerCount, SchemaVariant};
use geojson::{Feature, FeatureCollection};

/// Information about an export run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportInfo {
    /// Schema the collection was built with
    pub schema: SchemaVariant,
    /// Per-layer feature and skip counts, in render order
    pub layers: Vec<LayerCount>,
    /// Total number of features in the collection
    pub total_features: usize,
    /// Rows dropped across all layers
    pub skipped_rows: usize,
    /// WGS84 extent of the collection as `(min_lon, min_lat, max_lon, max_lat)`
    pub bounds: Option<(f64, f64, f64, f64)>,
}

/// A built collection together with its run information
#[derive(Debug, Clone)]
pub struct ExportedCollection {
    /// The GeoJSON document
    pub collection: FeatureCollection,
    /// Run summary
    pub info: ExportInfo,
}

impl ExportedCollection {
    /// Check if the collection has no features
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// Number of features in the collection
    #[inline]
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    /// Compact JSON rendering of the collection
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.collection)
    }
}

/// Wraps merged features as a `FeatureCollection`
#[derive(Debug, Clone, Copy)]
pub struct CollectionBuilder {
    schema: SchemaVariant,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl CollectionBuilder {
    /// Create a builder for collections of the given schema
    pub fn new(schema: SchemaVariant) -> Self {
        Self { schema }
    }

    /// The empty collection: `{"type":"FeatureCollection","features":[]}`
    pub fn empty() -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        }
    }

    /// Build the collection from merged features
    ///
    /// Features without a geometry are not valid output and are dropped. An empty input is
    /// not an error: it yields [`CollectionBuilder::empty`] and a warning.
    pub fn build(
        &self,
        mut features: Vec<Feature>,
        layers: Vec<LayerCount>,
        bounds: GeoBounds,
    ) -> ExportedCollection {
        let before = features.len();
        features.retain(|feature| feature.geometry.is_some());
        let dropped = before - features.len();
        if dropped > 0 {
            tracing::warn!("Dropped {dropped} features without geometry");
        }

        if features.is_empty() {
            tracing::warn!(
                "Database returned no features for schema {}, exporting an empty collection",
                self.schema
            );
        }

        let skipped_rows = layers.iter().map(|layer| layer.skipped).sum::<usize>() + dropped;
        let info = ExportInfo {
            schema: self.schema,
            layers,
            total_features: features.len(),
            skipped_rows,
            bounds: bounds.as_bbox(),
        };

        let mut collection = Self::empty();
        collection.features = features;

        ExportedCollection { collection, info }
    }
}
