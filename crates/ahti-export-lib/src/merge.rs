//! Layer merging in render order
//!
//! Renderers draw a collection front to back, so the position of a feature in the output is
//! its z-order. Layers are appended whole, in the order they are pushed, and the features of a
//! layer keep the order the source returned them in.

use crate::FeatureClass;
use geojson::Feature;

/// Per-layer outcome of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerCount {
    /// Layer class
    pub class: FeatureClass,
    /// Features emitted for the layer
    pub features: usize,
    /// Rows dropped because their geometry was missing or unreadable
    pub skipped: usize,
}

/// Stable concatenation of per-layer feature sequences
#[derive(Debug, Default)]
pub struct LayerMerger {
    features: Vec<Feature>,
    counts: Vec<LayerCount>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LayerMerger {
    /// Create an empty merger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a whole layer on top of the layers pushed so far
    pub fn push_layer(&mut self, class: FeatureClass, features: Vec<Feature>, skipped: usize) {
        self.counts.push(LayerCount {
            class,
            features: features.len(),
            skipped,
        });
        self.features.extend(features);
    }

    /// Number of features merged so far
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if no feature has been merged
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Consume the merger, returning the features and the per-layer counts
    pub fn finish(self) -> (Vec<Feature>, Vec<LayerCount>) {
        (self.features, self.counts)
    }
}
