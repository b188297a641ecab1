//! Exporter - the one-shot feature assembly pipeline
//!
//! Source query → feature mapper → layer merger → collection builder, driven by the layer
//! table of a [`SchemaVariant`]. [`Exporter::build`] is the first phase of a build-then-commit
//! export: it either returns the complete collection in memory or fails without side effects.

use crate::crs::{self, GeoBounds};
use crate::mapper::to_feature;
use crate::{
    CollectionBuilder, ExportedCollection, FeatureSource, LayerMerger, LayerSpec, Result,
    SchemaVariant,
};
use geojson::Feature;

/// Builds a `FeatureCollection` of one schema from a [`FeatureSource`]
#[derive(Debug)]
pub struct Exporter<S> {
    source: S,
    schema: SchemaVariant,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<S: FeatureSource> Exporter<S> {
    /// Create an exporter reading from `source`
    pub fn new(source: S, schema: SchemaVariant) -> Self {
        Self { source, schema }
    }

    /// Get back the source, e.g. to close its connection
    pub fn into_source(self) -> S {
        self.source
    }

    /// Build the whole collection in memory
    ///
    /// Issues one query per layer, in layer order. Any source error aborts the build, and so
    /// does a geometry outside WGS84 ranges. Rows with a null or unreadable geometry are skipped
    /// with a warning.
    pub fn build(&mut self) -> Result<ExportedCollection> {
        tracing::info!(
            "Exporting schema {} ({} layers, EPSG:{})",
            self.schema,
            self.schema.layers().len(),
            crs::TARGET_SRID
        );

        let mut merger = LayerMerger::new();
        let mut bounds = GeoBounds::default();

        for layer in self.schema.layers() {
            let (features, skipped) = self.build_layer(layer, &mut bounds)?;
            tracing::debug!(
                "Layer {}: {} features, {} skipped",
                layer.class(),
                features.len(),
                skipped
            );
            merger.push_layer(layer.class(), features, skipped);
        }

        let (features, layers) = merger.finish();
        Ok(CollectionBuilder::new(self.schema).build(features, layers, bounds))
    }

    /// Fetch and map a single layer
    fn build_layer(
        &mut self,
        layer: &LayerSpec,
        bounds: &mut GeoBounds,
    ) -> Result<(Vec<Feature>, usize)> {
        let rows = self.source.fetch(&layer.query)?;
        let mut features = Vec::with_capacity(rows.len());
        let mut skipped = 0;

        for (index, row) in rows.iter().enumerate() {
            let Some(geometry) = row.geometry.clone() else {
                tracing::warn!("Skipping {} row #{index} with null geometry", row.class);
                skipped += 1;
                continue;
            };

            if let Some(rect) = crs::ensure_geographic(row.class, &geometry)? {
                bounds.expand(rect);
            }

            features.push(to_feature(geometry, (layer.map)(row)));
        }

        Ok((features, skipped))
    }
}
