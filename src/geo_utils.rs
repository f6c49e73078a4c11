//! Geometric utilities shared by the assignment and merge engines.

use geo::{Area, BooleanOps, Contains, Geometry, MultiPolygon, Rect};
use rstar::AABB;

/// View a geometry as an areal multipolygon, if it has area at all.
///
/// Points and lines return `None`; the caller decides whether that is
/// "use point semantics" (assignment) or "malformed" (clipping).
pub fn to_area(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon(vec![t.to_polygon()])),
        _ => None,
    }
}

/// Union a sequence of multipolygons into one.
///
/// Folds pairwise; an empty input yields an empty multipolygon.
pub fn union_all(parts: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let mut iter = parts.iter();
    let Some(first) = iter.next() else {
        return MultiPolygon(vec![]);
    };
    iter.fold(first.clone(), |acc, part| acc.union(part))
}

/// Overlap between a feature geometry and a zone's areal shape.
///
/// Area features score their exact intersection area; point features
/// score 1.0 when contained, 0.0 otherwise. Non-areal, non-point
/// geometry scores 0.0.
pub fn overlap_area(feature: &Geometry<f64>, zone_area: &MultiPolygon<f64>) -> f64 {
    match feature {
        Geometry::Point(p) => {
            if zone_area.contains(p) {
                1.0
            } else {
                0.0
            }
        }
        other => match to_area(other) {
            Some(mp) => zone_area.intersection(&mp).unsigned_area(),
            None => 0.0,
        },
    }
}

/// Convert a bounding rect into an rstar envelope.
pub fn envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}
