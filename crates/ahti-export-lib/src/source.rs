//! Source queries and the stores that answer them
//!
//! A [`SourceQuery`] describes one feature class: which relation to read, which rows belong to
//! the class and which attribute columns the active schema needs. It renders to a single SQL
//! statement in which the geometry is already serialized as GeoJSON in WGS84 (see
//! [`crate::crs`]) and the attributes are packed into one JSON object by the store itself.

use crate::crs::{GEOMETRY_COLUMN, reproject_sql};
use crate::{ExportError, FeatureClass, RawRow, Result};
use geojson::{Geometry, JsonObject};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Column of `routes_tracer` holding the route as GeoJSON text, already in WGS84
pub const TRACER_GEOMETRY_COLUMN: &str = "geojson";

/// Source relations in the staging database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    CandidateObjects,
    DebugTerminals,
    PaddlingSegments,
    /// Traced routes, stored as GeoJSON text rather than PostGIS geometry
    RoutesTracer,
}

impl Relation {
    /// Table name in the store
    pub fn table(self) -> &'static str {
        match self {
            Relation::CandidateObjects => "candidate_objects",
            Relation::DebugTerminals => "debug_terminals",
            Relation::PaddlingSegments => "paddling_segments",
            Relation::RoutesTracer => "routes_tracer",
        }
    }

    /// SQL expression yielding the row geometry as GeoJSON text in WGS84
    pub fn geometry_sql(self) -> String {
        match self {
            Relation::RoutesTracer => TRACER_GEOMETRY_COLUMN.to_string(),
            Relation::CandidateObjects | Relation::DebugTerminals | Relation::PaddlingSegments => {
                reproject_sql(GEOMETRY_COLUMN)
            }
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Row predicate selecting one feature class from a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// `type = <value>`, the value is bound as a query parameter
    TypeEquals(&'static str),
    /// `is_virtual = true`, minus rows whose `type` is one of `except_types`
    ///
    /// A null `type` never matches `except_types`. The excluded types are compile-time
    /// constants of the layer tables and are inlined into the statement.
    IsVirtual {
        except_types: &'static [&'static str],
    },
    /// Every row of the relation
    All,
}

impl Selector {
    /// Evaluate the predicate against the native columns of a stored row
    pub fn matches(&self, columns: &JsonObject) -> bool {
        let row_type = columns.get("type").and_then(Value::as_str);
        match self {
            Selector::TypeEquals(value) => row_type == Some(*value),
            Selector::IsVirtual { except_types } => {
                columns.get("is_virtual") == Some(&Value::Bool(true))
                    && !row_type.is_some_and(|t| except_types.contains(&t))
            }
            Selector::All => true,
        }
    }
}

/// One declarative query per feature class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceQuery {
    /// Class label attached to every returned row
    pub class: FeatureClass,
    /// Relation to read from
    pub relation: Relation,
    /// Which rows of the relation belong to the class
    pub selector: Selector,
    /// Native attribute columns to select, in output order
    pub columns: &'static [&'static str],
}

impl SourceQuery {
    /// Create a query description
    pub const fn new(
        class: FeatureClass,
        relation: Relation,
        selector: Selector,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            class,
            relation,
            selector,
            columns,
        }
    }

    /// Render the SQL statement
    ///
    /// The statement returns two columns: `geometry` (GeoJSON geometry text in WGS84, nullable)
    /// and `attributes` (a JSON object keyed by the native column names). A
    /// [`Selector::TypeEquals`] value is bound as `$1`, see [`SourceQuery::bind_value`].
    pub fn to_sql(&self) -> String {
        let attributes = self
            .columns
            .iter()
            .map(|column| format!("'{column}', {column}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "SELECT {} AS geometry, json_build_object({attributes}) AS attributes FROM {}",
            self.relation.geometry_sql(),
            self.relation.table(),
        );

        match self.selector {
            Selector::TypeEquals(_) => sql.push_str(" WHERE type = $1"),
            Selector::IsVirtual { except_types } => {
                sql.push_str(" WHERE is_virtual = true");
                if !except_types.is_empty() {
                    let excluded = except_types
                        .iter()
                        .map(|t| format!("'{t}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" AND COALESCE(type, '') NOT IN ({excluded})"));
                }
            }
            Selector::All => {}
        }

        sql
    }

    /// Parameter to bind as `$1`, if the selector needs one
    #[inline]
    pub fn bind_value(&self) -> Option<&'static str> {
        match self.selector {
            Selector::TypeEquals(value) => Some(value),
            Selector::IsVirtual { .. } | Selector::All => None,
        }
    }
}

/// A read-only store that can answer [`SourceQuery`]s
///
/// Implementations return rows in the store's order; callers rely on that order being kept.
/// Any error is fatal for the export run.
pub trait FeatureSource {
    /// Run one query to completion
    fn fetch(&mut self, query: &SourceQuery) -> Result<Vec<RawRow>>;
}

impl<S: FeatureSource + ?Sized> FeatureSource for &mut S {
    fn fetch(&mut self, query: &SourceQuery) -> Result<Vec<RawRow>> {
        (**self).fetch(query)
    }
}

/// A row as stored in a relation, with all of its native columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRow {
    /// Geometry in WGS84, `None` for a null geometry
    pub geometry: Option<Geometry>,
    /// Native columns, including the ones selectors look at (`type`, `is_virtual`)
    pub columns: JsonObject,
}

impl StoredRow {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self {
            geometry,
            columns: JsonObject::new(),
        }
    }

    /// Builder-style helper: set one column
    pub fn with_column(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.insert(column.to_string(), value.into());
        self
    }
}

/// In-memory fixture store
///
/// Rows are kept per [`Relation`] in insertion order. A query sees the rows of its relation
/// that its [`Selector`] matches, projected onto the query's columns, the way the SQL
/// statement would return them. Used by tests and benchmarks to drive the pipeline without a
/// database.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: HashMap<Relation, Vec<StoredRow>>,
    failure: Option<String>,
    issued: Vec<SourceQuery>,
}

impl MemorySource {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to `relation`
    pub fn push(&mut self, relation: Relation, row: StoredRow) {
        self.rows.entry(relation).or_default().push(row);
    }

    /// Builder-style [`MemorySource::push`]
    pub fn with_row(mut self, relation: Relation, row: StoredRow) -> Self {
        self.push(relation, row);
        self
    }

    /// Make every subsequent query fail with `message`
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Queries issued so far, in order
    #[inline]
    pub fn issued(&self) -> &[SourceQuery] {
        &self.issued
    }
}

impl FeatureSource for MemorySource {
    fn fetch(&mut self, query: &SourceQuery) -> Result<Vec<RawRow>> {
        self.issued.push(*query);
        if let Some(message) = &self.failure {
            return Err(ExportError::Source(message.clone()));
        }

        let Some(rows) = self.rows.get(&query.relation) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .iter()
            .filter(|row| query.selector.matches(&row.columns))
            .map(|row| {
                let attributes = query
                    .columns
                    .iter()
                    .map(|column| {
                        let value = row.columns.get(*column).cloned().unwrap_or(Value::Null);
                        (column.to_string(), value)
                    })
                    .collect();
                RawRow::new(query.class, row.geometry.clone(), attributes)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const RIVERS: SourceQuery = SourceQuery::new(
        FeatureClass::River,
        Relation::CandidateObjects,
        Selector::TypeEquals("river"),
        &["name"],
    );

    const CONNECTORS: SourceQuery = SourceQuery::new(
        FeatureClass::Connector,
        Relation::CandidateObjects,
        Selector::IsVirtual {
            except_types: &["river", "lake"],
        },
        &["name"],
    );

    fn candidate(row_type: &str, is_virtual: bool, name: &str) -> StoredRow {
        StoredRow::new(None)
            .with_column("type", row_type)
            .with_column("is_virtual", is_virtual)
            .with_column("name", name)
    }

    fn names(rows: &[RawRow]) -> Vec<Value> {
        rows.iter().map(|r| r.attribute("name")).collect()
    }

    #[test]
    fn test_type_selector_binds_parameter() {
        assert_eq!(
            RIVERS.to_sql(),
            "SELECT ST_AsGeoJSON(ST_Transform(geom, 4326)) AS geometry, \
             json_build_object('name', name) AS attributes \
             FROM candidate_objects WHERE type = $1"
        );
        assert_eq!(RIVERS.bind_value(), Some("river"));
    }

    #[test]
    fn test_virtual_selector_excludes_types() {
        let sql = CONNECTORS.to_sql();
        assert!(sql.ends_with(
            "FROM candidate_objects WHERE is_virtual = true \
             AND COALESCE(type, '') NOT IN ('river', 'lake')"
        ));
        assert_eq!(CONNECTORS.bind_value(), None);

        let plain = SourceQuery::new(
            FeatureClass::Connector,
            Relation::CandidateObjects,
            Selector::IsVirtual { except_types: &[] },
            &[],
        );
        assert!(plain.to_sql().ends_with("WHERE is_virtual = true"));
        assert!(plain.to_sql().contains("json_build_object() AS attributes"));
    }

    #[test]
    fn test_all_selector_has_no_where_clause() {
        let query = SourceQuery::new(
            FeatureClass::Segment,
            Relation::PaddlingSegments,
            Selector::All,
            &["type", "rapid_class"],
        );
        let sql = query.to_sql();
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("json_build_object('type', type, 'rapid_class', rapid_class)"));
        assert!(sql.ends_with("FROM paddling_segments"));
    }

    #[test]
    fn test_tracer_geometry_is_not_reprojected() {
        let query = SourceQuery::new(
            FeatureClass::Route,
            Relation::RoutesTracer,
            Selector::All,
            &["id"],
        );
        assert_eq!(
            query.to_sql(),
            "SELECT geojson AS geometry, json_build_object('id', id) AS attributes \
             FROM routes_tracer"
        );
    }

    #[test]
    fn test_selector_matches() {
        let lake = candidate("lake", true, "Päijänne").columns;
        let portage = candidate("portage", true, "Koskenniska").columns;
        let untyped = StoredRow::new(None).with_column("is_virtual", true).columns;

        assert!(Selector::TypeEquals("lake").matches(&lake));
        assert!(!Selector::TypeEquals("river").matches(&lake));
        assert!(!CONNECTORS.selector.matches(&lake));
        assert!(CONNECTORS.selector.matches(&portage));
        assert!(CONNECTORS.selector.matches(&untyped));
        assert!(!CONNECTORS.selector.matches(&candidate("portage", false, "x").columns));
        assert!(Selector::All.matches(&JsonObject::new()));
    }

    #[test]
    fn test_memory_source_filters_and_preserves_order() {
        let mut source = MemorySource::new()
            .with_row(Relation::CandidateObjects, candidate("river", false, "Kymijoki"))
            .with_row(Relation::CandidateObjects, candidate("lake", false, "Päijänne"))
            .with_row(Relation::CandidateObjects, candidate("culvert", true, "Rumpu"))
            .with_row(Relation::CandidateObjects, candidate("river", false, "Vantaanjoki"));

        let rivers = source.fetch(&RIVERS).unwrap();
        assert_eq!(names(&rivers), vec!["Kymijoki", "Vantaanjoki"]);
        assert!(rivers.iter().all(|r| r.class == FeatureClass::River));

        let connectors = source.fetch(&CONNECTORS).unwrap();
        assert_eq!(names(&connectors), vec!["Rumpu"]);
        assert_eq!(source.issued(), &[RIVERS, CONNECTORS]);
    }

    #[test]
    fn test_memory_source_projects_selected_columns() {
        let mut source = MemorySource::new().with_row(
            Relation::CandidateObjects,
            candidate("river", false, "Kymijoki").with_column("length_m", 1200),
        );
        let rows = source.fetch(&RIVERS).unwrap();
        assert_eq!(
            serde_json::to_value(&rows[0].attributes).unwrap(),
            json!({"name": "Kymijoki"})
        );
    }

    #[test]
    fn test_memory_source_reads_only_the_query_relation() {
        let mut source = MemorySource::new().with_row(
            Relation::PaddlingSegments,
            StoredRow::new(None).with_column("type", "river"),
        );
        assert!(source.fetch(&RIVERS).unwrap().is_empty());
    }

    #[test]
    fn test_memory_source_failure() {
        let mut source = MemorySource::new().fail_with("connection refused");
        let err = source.fetch(&RIVERS).unwrap_err();
        assert_eq!(err.to_string(), "Source error: connection refused");
    }
}
