//! Output schema variants
//!
//! The debug exports went through three schemas. Rather than three pipelines, each variant is
//! a small table of layers: the query that selects a class and the mapper that turns its rows
//! into properties. Layer order in the table is the render order of the output (later layers
//! are drawn on top).

use crate::mapper::{self, ROUTE_COLUMNS, SEGMENT_COLUMNS};
use crate::{FeatureClass, RawRow, Relation, Selector, SourceQuery};
use geojson::JsonObject;
use std::fmt;

/// Which property schema the export emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SchemaVariant {
    /// Rivers, connectors and decision points tagged with `debug_type`/`status`
    Debug,
    /// Rivers and connectors tagged with `type`/`name`
    #[value(name = "v15")]
    V15,
    /// Lake polygons and paddling segments with scores and rapid classes
    #[default]
    #[value(name = "v18-unified")]
    V18Unified,
    /// Traced routes tagged with `id`/`name`/`length_km`
    Tracer,
}

/// One layer of a schema: a source query and the mapping applied to its rows
#[derive(Clone, Copy)]
pub struct LayerSpec {
    /// Query selecting the rows of this layer
    pub query: SourceQuery,
    /// Row → properties mapping
    pub map: fn(&RawRow) -> JsonObject,
}

impl fmt::Debug for LayerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerSpec")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl LayerSpec {
    /// Feature class of the layer
    #[inline]
    pub fn class(&self) -> FeatureClass {
        self.query.class
    }
}

/// Virtual rows of these types are drawn by their own layer, never as connectors
const NON_CONNECTOR_TYPES: &[&str] = &["river", "lake"];

const CONNECTORS: Selector = Selector::IsVirtual {
    except_types: NON_CONNECTOR_TYPES,
};

const DEBUG_LAYERS: &[LayerSpec] = &[
    // Background
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::River,
            Relation::CandidateObjects,
            Selector::TypeEquals("river"),
            &[],
        ),
        map: mapper::debug_class_row,
    },
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::Connector,
            Relation::CandidateObjects,
            CONNECTORS,
            &[],
        ),
        map: mapper::debug_class_row,
    },
    // Decision points on top
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::Terminal,
            Relation::DebugTerminals,
            Selector::All,
            &["status"],
        ),
        map: mapper::debug_terminal,
    },
];

const V15_LAYERS: &[LayerSpec] = &[
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::River,
            Relation::CandidateObjects,
            Selector::TypeEquals("river"),
            &["name"],
        ),
        map: mapper::v15_class_row,
    },
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::Connector,
            Relation::CandidateObjects,
            CONNECTORS,
            &["name"],
        ),
        map: mapper::v15_class_row,
    },
];

const V18_LAYERS: &[LayerSpec] = &[
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::Lake,
            Relation::CandidateObjects,
            Selector::TypeEquals("lake"),
            &["name"],
        ),
        map: mapper::v18_lake,
    },
    LayerSpec {
        query: SourceQuery::new(
            FeatureClass::Segment,
            Relation::PaddlingSegments,
            Selector::All,
            SEGMENT_COLUMNS,
        ),
        map: mapper::v18_segment,
    },
];

const TRACER_LAYERS: &[LayerSpec] = &[LayerSpec {
    query: SourceQuery::new(
        FeatureClass::Route,
        Relation::RoutesTracer,
        Selector::All,
        ROUTE_COLUMNS,
    ),
    map: mapper::tracer_route,
}];

impl SchemaVariant {
    /// Layers of this variant, background first
    pub fn layers(self) -> &'static [LayerSpec] {
        match self {
            SchemaVariant::Debug => DEBUG_LAYERS,
            SchemaVariant::V15 => V15_LAYERS,
            SchemaVariant::V18Unified => V18_LAYERS,
            SchemaVariant::Tracer => TRACER_LAYERS,
        }
    }

    /// File name the export is written to when no output path is given
    pub fn default_file_name(self) -> &'static str {
        match self {
            SchemaVariant::Debug => "debug_data.json",
            SchemaVariant::V15 => "debug_data_v15.json",
            SchemaVariant::V18Unified => "local_data_qa.json",
            SchemaVariant::Tracer => "routes_tracer.json",
        }
    }

    /// Short name as used on the command line
    pub fn name(self) -> &'static str {
        match self {
            SchemaVariant::Debug => "debug",
            SchemaVariant::V15 => "v15",
            SchemaVariant::V18Unified => "v18-unified",
            SchemaVariant::Tracer => "tracer",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoredRow;
    use clap::ValueEnum;

    fn classes(variant: SchemaVariant) -> Vec<FeatureClass> {
        variant.layers().iter().map(LayerSpec::class).collect()
    }

    #[test]
    fn test_layer_order_per_variant() {
        assert_eq!(
            classes(SchemaVariant::Debug),
            vec![
                FeatureClass::River,
                FeatureClass::Connector,
                FeatureClass::Terminal
            ]
        );
        assert_eq!(
            classes(SchemaVariant::V15),
            vec![FeatureClass::River, FeatureClass::Connector]
        );
        assert_eq!(
            classes(SchemaVariant::V18Unified),
            vec![FeatureClass::Lake, FeatureClass::Segment]
        );
        assert_eq!(classes(SchemaVariant::Tracer), vec![FeatureClass::Route]);
    }

    #[test]
    fn test_lakes_are_selected_by_type() {
        let lakes = SchemaVariant::V18Unified.layers()[0].query;
        assert_eq!(lakes.relation, Relation::CandidateObjects);
        assert_eq!(lakes.bind_value(), Some("lake"));
    }

    #[test]
    fn test_connectors_are_selected_by_virtual_flag() {
        for variant in [SchemaVariant::Debug, SchemaVariant::V15] {
            let connectors = variant.layers()[1].query;
            assert_eq!(connectors.selector, CONNECTORS);
            let virtual_lake = StoredRow::new(None)
                .with_column("type", "lake")
                .with_column("is_virtual", true);
            assert!(!connectors.selector.matches(&virtual_lake.columns));
        }
    }

    #[test]
    fn test_cli_names_round_trip() {
        for variant in SchemaVariant::value_variants() {
            let parsed = SchemaVariant::from_str(variant.name(), false).unwrap();
            assert_eq!(parsed, *variant);
        }
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(SchemaVariant::Debug.default_file_name(), "debug_data.json");
        assert_eq!(SchemaVariant::V15.default_file_name(), "debug_data_v15.json");
        assert_eq!(
            SchemaVariant::V18Unified.default_file_name(),
            "local_data_qa.json"
        );
        assert_eq!(SchemaVariant::Tracer.default_file_name(), "routes_tracer.json");
    }
}
