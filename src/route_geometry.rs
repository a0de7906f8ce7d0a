// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::error::GeometryError;
use geo::Point;
use serde_json::Value;

/// Reads a route's stored GeoJSON geometry into an ordered list of (lon, lat) vertices.
///
/// Only a `LineString` with at least two finite positions is accepted. Positions may
/// carry a third (altitude) ordinate, which is dropped.
pub fn polyline_from_geojson(geometry: Option<&Value>) -> Result<Vec<Point<f64>>, GeometryError> {
    let value = match geometry {
        None | Some(Value::Null) => return Err(GeometryError::Missing),
        Some(value) => value,
    };

    // some clients store the geometry as a JSON encoded string
    let parsed_from_string;
    let value = match value {
        Value::String(raw) => {
            parsed_from_string = serde_json::from_str::<Value>(raw)
                .map_err(|e| GeometryError::Malformed(e.to_string()))?;
            &parsed_from_string
        }
        other => other,
    };

    let geometry = geojson::Geometry::try_from(value.clone())
        .map_err(|e| GeometryError::Malformed(e.to_string()))?;

    let positions = match geometry.value {
        geojson::Value::LineString(positions) => positions,
        other => return Err(GeometryError::NotLineString(geometry_type_name(&other).to_string())),
    };

    if positions.len() < 2 {
        return Err(GeometryError::TooFewVertices(positions.len()));
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, position)| match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Point::new(*lon, *lat)),
            _ => Err(GeometryError::BadPosition(i)),
        })
        .collect()
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
