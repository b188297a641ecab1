//! Coordinate reference system contract
//!
//! Candidate geometries are stored in a projected, metric CRS. Every query on a PostGIS relation
//! wraps the geometry column in exactly one [`reproject_sql`] call, so rows arrive in WGS84
//! (EPSG:4326). Traced routes are stored as GeoJSON text, which is WGS84 already.
//! [`ensure_geographic`] is the guard on the other side: it rejects any geometry whose
//! coordinates fall outside longitude/latitude ranges, which is what un-reprojected meters look
//! like.

use crate::{ExportError, FeatureClass, Result};
use geo::{BoundingRect, Coord, Rect};
use geojson::Geometry;

/// Authority code of the output CRS (WGS84 longitude/latitude)
pub const TARGET_SRID: u32 = 4326;

/// Name of the geometry column in every candidate relation
pub const GEOMETRY_COLUMN: &str = "geom";

/// Valid longitude range in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Valid latitude range in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// SQL expression that reprojects `column` to WGS84 and serializes it as GeoJSON geometry text
///
/// This is the only place the reprojection is spelled out; queries must not transform twice.
pub fn reproject_sql(column: &str) -> String {
    format!("ST_AsGeoJSON(ST_Transform({column}, {TARGET_SRID}))")
}

/// Check if a coordinate is a valid WGS84 longitude/latitude pair
#[inline(always)]
pub fn is_valid_wgs84(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&coord.x)
        && (-MAX_LATITUDE..=MAX_LATITUDE).contains(&coord.y)
}

/// Verify that a geometry is expressed in WGS84 longitude/latitude
///
/// # Returns
/// The bounding rectangle of the geometry in degrees, or `None` for an empty geometry
/// (e.g. an empty `GeometryCollection`), which has no coordinates to check.
pub fn ensure_geographic(class: FeatureClass, geometry: &Geometry) -> Result<Option<Rect<f64>>> {
    let shape = geo::Geometry::<f64>::try_from(geometry.value.clone()).map_err(|e| {
        ExportError::NotGeographic {
            class,
            reason: format!("unsupported geometry: {e}"),
        }
    })?;

    let Some(rect) = shape.bounding_rect() else {
        return Ok(None);
    };

    // Both corners inside the valid range means every coordinate is
    for corner in [rect.min(), rect.max()] {
        if !is_valid_wgs84(corner) {
            return Err(ExportError::NotGeographic {
                class,
                reason: format!("coordinate ({}, {}) out of range", corner.x, corner.y),
            });
        }
    }

    Ok(Some(rect))
}

/// Accumulated WGS84 extent of all emitted geometries
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoBounds {
    rect: Option<Rect<f64>>,
}

impl GeoBounds {
    /// Grow the bounds to include `other`
    pub fn expand(&mut self, other: Rect<f64>) {
        match &mut self.rect {
            Some(bbox) => {
                *bbox = Rect::new(
                    Coord {
                        x: bbox.min().x.min(other.min().x),
                        y: bbox.min().y.min(other.min().y),
                    },
                    Coord {
                        x: bbox.max().x.max(other.max().x),
                        y: bbox.max().y.max(other.max().y),
                    },
                );
            }
            None => self.rect = Some(other),
        }
    }

    /// Returns `Some((min_lon, min_lat, max_lon, max_lat))`, the GeoJSON `bbox` order
    pub fn as_bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.rect
            .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
    }
}
