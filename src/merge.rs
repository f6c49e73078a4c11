//! # Overlay Merge Engine
//!
//! Combines a zone's baseline ("Default") geometry set with a newly
//! assigned partial set, producing the geometry for a new configuration
//! without ever mutating the baseline.
//!
//! Single-owner kinds follow "new replaces baseline wherever its
//! coverage overlaps, additive elsewhere": baseline features inside the
//! exclusion area (convex hull of all new building/land-cover/land-use
//! geometry) are dropped, everything new is appended. Multi-owner kinds
//! follow "cut a hole, fill it": the union of the new geometry is
//! subtracted from every baseline shape before the new geometry is
//! appended.

use geo::{Area, BooleanOps, Contains, ConvexHull, Geometry, Intersects, MultiPolygon, Polygon};
use log::{debug, info};

use crate::error::Result;
use crate::feature::{Feature, GeometrySet, GeometryType};
use crate::geo_utils::{to_area, union_all};

/// Merge newly assigned geometry with a zone's baseline set.
///
/// The caller is responsible for loading `baseline` from the zone's
/// first configuration; a zone with no prior configurations skips the
/// merge entirely and imports the new set as-is.
pub fn merge(zone_id: i64, baseline: &GeometrySet, new: &GeometrySet) -> Result<GeometrySet> {
    let exclusion = exclusion_area(new);
    let mut merged = GeometrySet::default();

    for kind in [GeometryType::Building, GeometryType::Vegetation] {
        let features = merge_single_owner(baseline.get(kind), new.get(kind), exclusion.as_ref());
        if let Some(slot) = merged.get_mut(kind) {
            *slot = features;
        }
    }
    for kind in [GeometryType::LandCover, GeometryType::LandUse] {
        let features = merge_multi_owner(baseline.get(kind), new.get(kind))?;
        if let Some(slot) = merged.get_mut(kind) {
            *slot = features;
        }
    }

    info!(
        "[Merge] Zone {}: merged {} baseline + {} new features into {}",
        zone_id,
        baseline.len(),
        new.len(),
        merged.len()
    );
    Ok(merged)
}

/// Convex hull of the union of all new building, land-cover and
/// land-use geometry. Vegetation never contributes. `None` when there
/// is nothing areal to build a hull from, which turns the single-owner
/// filter into a no-op.
fn exclusion_area(new: &GeometrySet) -> Option<Polygon<f64>> {
    let parts: Vec<MultiPolygon<f64>> = [
        GeometryType::Building,
        GeometryType::LandCover,
        GeometryType::LandUse,
    ]
    .iter()
    .flat_map(|kind| new.get(*kind))
    .filter_map(|feature| to_area(&feature.geometry))
    .collect();

    if parts.is_empty() {
        return None;
    }
    let union = union_all(&parts);
    if union.unsigned_area() <= 0.0 {
        return None;
    }
    Some(union.convex_hull())
}

/// Keep baseline features outside the exclusion area, then append all
/// new features.
fn merge_single_owner(
    baseline: &[Feature],
    new: &[Feature],
    exclusion: Option<&Polygon<f64>>,
) -> Vec<Feature> {
    let mut result: Vec<Feature> = baseline
        .iter()
        .filter(|feature| match exclusion {
            None => true,
            Some(hull) => match &feature.geometry {
                Geometry::Point(p) => !hull.contains(p),
                other => !hull.intersects(other),
            },
        })
        .cloned()
        .collect();
    result.extend(new.iter().cloned());
    result
}

/// Cut-and-fill: punch the union of the new geometry out of every
/// baseline shape, then append the new geometry. No new geometry means
/// baseline passes through unchanged.
fn merge_multi_owner(baseline: &[Feature], new: &[Feature]) -> Result<Vec<Feature>> {
    if new.is_empty() {
        return Ok(baseline.to_vec());
    }

    let cut_parts: Vec<MultiPolygon<f64>> = new
        .iter()
        .filter_map(|feature| to_area(&feature.geometry))
        .collect();
    let cut_out = union_all(&cut_parts);

    let mut result = Vec::with_capacity(baseline.len() + new.len());
    for feature in baseline {
        let Some(shape) = to_area(&feature.geometry) else {
            // Non-areal baseline rows cannot be holed; keep them intact
            result.push(feature.clone());
            continue;
        };
        let remainder = shape.difference(&cut_out);
        if remainder.unsigned_area() <= 0.0 {
            debug!(
                "[Merge] Baseline {} feature {:?} fully covered by new geometry; dropped",
                feature.kind, feature.id
            );
            continue;
        }
        result.push(feature.clone().with_geometry(Geometry::MultiPolygon(remainder))?);
    }
    result.extend(new.iter().cloned());
    Ok(result)
}
