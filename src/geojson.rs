//! GeoJSON conversion boundary.
//!
//! All geometry enters and leaves the store as GeoJSON-shaped
//! `serde_json::Value`s; internally everything is `geo::Geometry<f64>`.
//! These are the only two conversion points in the crate, so the merge
//! and assignment engines never round-trip through JSON.

use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Value};

use crate::error::{Result, ZoneStoreError};

fn invalid(message: impl Into<String>) -> ZoneStoreError {
    ZoneStoreError::InvalidGeometry {
        message: message.into(),
    }
}

/// Parse a GeoJSON geometry object into a `geo::Geometry`.
///
/// Supports Point, LineString, Polygon and MultiPolygon — the kinds the
/// upload collaborators produce. Anything else is invalid input.
pub fn geometry_from_value(value: &Value) -> Result<Geometry<f64>> {
    let kind = value["type"]
        .as_str()
        .ok_or_else(|| invalid("missing 'type' member"))?;
    let coords = value
        .get("coordinates")
        .ok_or_else(|| invalid(format!("{} without 'coordinates'", kind)))?;

    match kind {
        "Point" => {
            let c = parse_position(coords)?;
            Ok(Geometry::Point(Point::from(c)))
        }
        "LineString" => Ok(Geometry::LineString(parse_ring(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => {
            let parts = coords
                .as_array()
                .ok_or_else(|| invalid("MultiPolygon coordinates must be an array"))?;
            let polygons = parts
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        other => Err(invalid(format!("unsupported geometry type '{}'", other))),
    }
}

/// Serialize a `geo::Geometry` back to a GeoJSON geometry object.
pub fn geometry_to_value(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({
            "type": "Point",
            "coordinates": [p.x(), p.y()],
        }),
        Geometry::LineString(ls) => json!({
            "type": "LineString",
            "coordinates": ring_coords(ls),
        }),
        Geometry::Polygon(p) => json!({
            "type": "Polygon",
            "coordinates": polygon_coords(p),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_coords).collect::<Vec<_>>(),
        }),
        // Remaining geo variants never leave the store (clipping emits
        // only polygons); encode them as empty collections for safety.
        _ => json!({ "type": "GeometryCollection", "geometries": [] }),
    }
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = value
        .as_array()
        .ok_or_else(|| invalid("position must be an array"))?;
    if pair.len() < 2 {
        return Err(invalid("position needs at least two ordinates"));
    }
    let x = pair[0]
        .as_f64()
        .ok_or_else(|| invalid("non-numeric ordinate"))?;
    let y = pair[1]
        .as_f64()
        .ok_or_else(|| invalid("non-numeric ordinate"))?;
    Ok(Coord { x, y })
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let positions = value
        .as_array()
        .ok_or_else(|| invalid("ring must be an array of positions"))?;
    let coords = positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value
        .as_array()
        .ok_or_else(|| invalid("Polygon coordinates must be an array of rings"))?;
    let mut iter = rings.iter();
    let exterior = parse_ring(iter.next().ok_or_else(|| invalid("Polygon with no rings"))?)?;
    if exterior.0.len() < 4 {
        return Err(invalid("Polygon exterior ring has fewer than 4 positions"));
    }
    let interiors = iter.map(parse_ring).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_coords(ls: &LineString<f64>) -> Vec<Vec<f64>> {
    ls.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_coords(p: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    let mut rings = vec![ring_coords(p.exterior())];
    for interior in p.interiors() {
        rings.push(ring_coords(interior));
    }
    rings
}
