//! Raw rows as they leave a source query
//!
//! A [`RawRow`] is the unit handed from a [`crate::FeatureSource`] to the mapper: a geometry
//! that has already been reprojected to WGS84 and the class-specific attributes selected for
//! it, keyed by their native column names.

use geojson::{Geometry, JsonObject};
use serde_json::Value;
use std::fmt;

/// The feature classes the pipeline knows how to select and map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FeatureClass {
    /// `candidate_objects` rows with `type = 'river'`
    River,
    /// Virtual `candidate_objects` rows (portages, culverts)
    Connector,
    /// `debug_terminals` decision points
    Terminal,
    /// `candidate_objects` rows with `type = 'lake'`
    Lake,
    /// `paddling_segments` rows
    Segment,
    /// `routes_tracer` rows
    Route,
}

impl FeatureClass {
    /// Stable lowercase label, used in logs and by the schemas that tag rows by class
    pub fn label(self) -> &'static str {
        match self {
            FeatureClass::River => "river",
            FeatureClass::Connector => "connector",
            FeatureClass::Terminal => "point",
            FeatureClass::Lake => "lake",
            FeatureClass::Segment => "segment",
            FeatureClass::Route => "route",
        }
    }
}

impl fmt::Display for FeatureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a source query
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Class of the query that produced this row
    pub class: FeatureClass,
    /// Geometry in WGS84, `None` when the store returned a null geometry
    pub geometry: Option<Geometry>,
    /// Selected attributes keyed by native column name
    pub attributes: JsonObject,
}

impl RawRow {
    /// Create a row from its parts
    pub fn new(class: FeatureClass, geometry: Option<Geometry>, attributes: JsonObject) -> Self {
        Self {
            class,
            geometry,
            attributes,
        }
    }

    /// Attribute value by column name, `Null` when the column was not selected or is null
    #[inline]
    pub fn attribute(&self, column: &str) -> Value {
        self.attributes.get(column).cloned().unwrap_or(Value::Null)
    }

    #[cfg(test)]
    pub(crate) fn with_attribute(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(column.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_labels_match_debug_layer_names() {
        assert_eq!(FeatureClass::River.label(), "river");
        assert_eq!(FeatureClass::Connector.label(), "connector");
        assert_eq!(FeatureClass::Terminal.label(), "point");
        assert_eq!(FeatureClass::Terminal.to_string(), "point");
    }

    #[test]
    fn test_missing_attribute_is_null() {
        let row = RawRow::new(FeatureClass::Segment, None, JsonObject::new())
            .with_attribute("rapid_class", "II");
        assert_eq!(row.attribute("rapid_class"), json!("II"));
        assert_eq!(row.attribute("fun_score"), Value::Null);
    }
}
