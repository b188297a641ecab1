//! Row → Feature mapping
//!
//! Each schema variant has its own fixed property set; the functions here are the per-class
//! entries of those sets. They are pure and total: attributes missing from a row come out as
//! `null` and nothing is filtered or reprojected here.

use crate::RawRow;
use geojson::{Feature, Geometry, JsonObject};
use serde_json::Value;

/// Status emitted for debug rows that are not decision points
pub const STATUS_NONE: &str = "none";

/// Constant `type` given to lake polygons in the unified schema
pub const LAKE_TYPE_LABEL: &str = "lake_gray";

/// Copy `columns` from the row, in order, as `null` when absent
fn passthrough(row: &RawRow, columns: &[&str]) -> JsonObject {
    columns
        .iter()
        .map(|column| (column.to_string(), row.attribute(column)))
        .collect()
}

/// Debug schema, background and connector layers: `{debug_type, status: "none"}`
pub fn debug_class_row(row: &RawRow) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("debug_type".into(), Value::from(row.class.label()));
    properties.insert("status".into(), Value::from(STATUS_NONE));
    properties
}

/// Debug schema, decision points: `{debug_type: "point", status}`
pub fn debug_terminal(row: &RawRow) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("debug_type".into(), Value::from(row.class.label()));
    properties.insert("status".into(), row.attribute("status"));
    properties
}

/// v15 schema: `{type: <class label>, name}`
pub fn v15_class_row(row: &RawRow) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("type".into(), Value::from(row.class.label()));
    properties.insert("name".into(), row.attribute("name"));
    properties
}

/// Unified schema, lake polygons: `{type: "lake_gray", name}`
pub fn v18_lake(row: &RawRow) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("type".into(), Value::from(LAKE_TYPE_LABEL));
    properties.insert("name".into(), row.attribute("name"));
    properties
}

/// Attribute columns of a paddling segment, in output order
pub const SEGMENT_COLUMNS: &[&str] = &[
    "type",
    "name",
    "environment",
    "fun_score",
    "feasibility_score",
    "rapid_class",
];

/// Unified schema, paddling segments: every segment attribute passed through
pub fn v18_segment(row: &RawRow) -> JsonObject {
    passthrough(row, SEGMENT_COLUMNS)
}

/// Attribute columns of a traced route, in output order
pub const ROUTE_COLUMNS: &[&str] = &["id", "name", "length_km"];

/// Traced routes: `{id, name, length_km}`
pub fn tracer_route(row: &RawRow) -> JsonObject {
    passthrough(row, ROUTE_COLUMNS)
}

/// Wrap a geometry and its properties as a GeoJSON feature
pub fn to_feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureClass;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(class: FeatureClass) -> RawRow {
        RawRow::new(class, None, JsonObject::new())
    }

    fn props(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_debug_background_rows_use_sentinel_status() {
        let river = row(FeatureClass::River).with_attribute("name", "Kymijoki");
        assert_eq!(
            debug_class_row(&river),
            props(json!({"debug_type": "river", "status": "none"}))
        );
        assert_eq!(
            debug_class_row(&row(FeatureClass::Connector)),
            props(json!({"debug_type": "connector", "status": "none"}))
        );
    }

    #[test]
    fn test_debug_terminal_keeps_status() {
        let terminal = row(FeatureClass::Terminal).with_attribute("status", "dead_end");
        assert_eq!(
            debug_terminal(&terminal),
            props(json!({"debug_type": "point", "status": "dead_end"}))
        );
    }

    #[test]
    fn test_debug_terminal_null_status_is_not_fabricated() {
        assert_eq!(
            debug_terminal(&row(FeatureClass::Terminal)),
            props(json!({"debug_type": "point", "status": null}))
        );
    }

    #[test]
    fn test_v15_uses_class_label_not_source_type() {
        let portage = row(FeatureClass::Connector)
            .with_attribute("type", "portage")
            .with_attribute("name", "Koskenniska");
        assert_eq!(
            v15_class_row(&portage),
            props(json!({"type": "connector", "name": "Koskenniska"}))
        );
    }

    #[test]
    fn test_v18_lake_uses_literal_type() {
        let lake = row(FeatureClass::Lake)
            .with_attribute("type", "lake")
            .with_attribute("name", "Päijänne");
        assert_eq!(
            v18_lake(&lake),
            props(json!({"type": "lake_gray", "name": "Päijänne"}))
        );
    }

    #[test]
    fn test_v18_segment_keeps_nulls() {
        let segment = row(FeatureClass::Segment)
            .with_attribute("type", "river")
            .with_attribute("rapid_class", "II")
            .with_attribute("fun_score", 7)
            .with_attribute("feasibility_score", Value::Null);

        let properties = v18_segment(&segment);
        assert_eq!(
            properties,
            props(json!({
                "type": "river",
                "name": null,
                "environment": null,
                "fun_score": 7,
                "feasibility_score": null,
                "rapid_class": "II"
            }))
        );
        assert!(properties.contains_key("feasibility_score"));
    }

    #[test]
    fn test_tracer_route_properties() {
        let route = row(FeatureClass::Route)
            .with_attribute("id", 42)
            .with_attribute("name", "Saimaa loop")
            .with_attribute("length_km", 12.5);
        assert_eq!(
            tracer_route(&route),
            props(json!({"id": 42, "name": "Saimaa loop", "length_km": 12.5}))
        );
        assert_eq!(
            tracer_route(&row(FeatureClass::Route)),
            props(json!({"id": null, "name": null, "length_km": null}))
        );
    }

    #[test]
    fn test_to_feature_serializes_as_geojson_feature() {
        let geometry = Geometry::new(geojson::Value::Point(vec![25.0, 61.0]));
        let feature = to_feature(geometry, props(json!({"type": "lake_gray"})));
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["properties"]["type"], "lake_gray");
    }
}
