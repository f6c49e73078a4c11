//! # Spatial Assignment Engine
//!
//! Resolves which zone(s) each staged feature belongs to.
//!
//! Single-owner kinds (buildings, vegetation) go to the zone with the
//! maximum overlap; ties at a positive maximum are logged and broken
//! deterministically toward the highest zone id. Multi-owner kinds
//! (land-use, land-cover) are clipped to every overlapping zone, so one
//! source feature may be split across several zones.

use std::collections::HashMap;

use geo::{Area, BooleanOps, Geometry, MultiPolygon};
use log::warn;
use rstar::RTree;
use serde_json::Value;

use crate::error::{Result, ZoneStoreError};
use crate::feature::{Feature, GeometryType, Zone};
use crate::geo_utils::{overlap_area, to_area};
use crate::index::{candidates_in_rect, ZoneBoundsEntry};

/// Output of one assignment pass.
///
/// Totality: every input feature ends up assigned, unassigned, or (for
/// clipping) represented among the malformed fragments.
#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    /// Assigned features per zone, stamped with `properties["zone_id"]`.
    pub by_zone: HashMap<i64, Vec<Feature>>,
    /// Features overlapping no candidate zone.
    pub unassigned: Vec<Feature>,
    /// GeoJSON fragments the clipping policy could not keep.
    pub malformed: Vec<Value>,
}

/// Assign a batch of staged features of one kind to candidate zones.
///
/// `zones` is the candidate set (materialized); the index narrows the
/// per-feature candidates by bounding box before exact predicates run.
/// With `include_empty_zones`, every candidate zone appears in the
/// result map even when it receives nothing — required ahead of overlay
/// merging so "no new geometry" is distinguishable from "cleared".
pub fn assign(
    kind: GeometryType,
    features: Vec<Feature>,
    zones: &HashMap<i64, Zone>,
    index: &RTree<ZoneBoundsEntry>,
    include_empty_zones: bool,
) -> Result<AssignmentOutcome> {
    let single_owner = kind
        .single_owner()
        .ok_or_else(|| ZoneStoreError::UnsupportedGeometry {
            message: format!("assignment does not handle {} features", kind),
        })?;

    let total = features.len();
    let mut outcome = AssignmentOutcome::default();
    if include_empty_zones {
        for zone_id in zones.keys() {
            outcome.by_zone.entry(*zone_id).or_default();
        }
    }

    for feature in features {
        let candidates: Vec<&Zone> = candidates_in_rect(index, &feature.bounds)
            .into_iter()
            .filter_map(|id| zones.get(&id))
            .collect();

        if single_owner {
            assign_single_owner(feature, &candidates, &mut outcome);
        } else {
            assign_multi_owner(feature, &candidates, &mut outcome);
        }
    }

    // A batch that produced nothing but malformed fragments is not a
    // partial result, it is a wrong input.
    let produced: usize = outcome.by_zone.values().map(Vec::len).sum();
    if total > 0 && produced == 0 && outcome.unassigned.is_empty() && !outcome.malformed.is_empty()
    {
        return Err(ZoneStoreError::UnsupportedGeometry {
            message: format!("entire {} batch was non-polygonal ({} fragments)", kind, total),
        });
    }

    if !include_empty_zones {
        outcome.by_zone.retain(|_, features| !features.is_empty());
    }
    Ok(outcome)
}

/// Max-overlap assignment; ties at a positive maximum go to the highest
/// zone id (pinned behavior, logged when it happens).
fn assign_single_owner(mut feature: Feature, candidates: &[&Zone], outcome: &mut AssignmentOutcome) {
    let mut best_area = 0.0f64;
    let mut winners: Vec<i64> = Vec::new();

    for zone in candidates {
        let Some(zone_area) = to_area(&zone.geometry) else {
            continue;
        };
        let overlap = overlap_area(&feature.geometry, &zone_area);
        if overlap <= 0.0 {
            continue;
        }
        if overlap > best_area {
            best_area = overlap;
            winners.clear();
            winners.push(zone.id);
        } else if overlap == best_area {
            winners.push(zone.id);
        }
    }

    let Some(&winner) = winners.iter().max() else {
        outcome.unassigned.push(feature);
        return;
    };
    if winners.len() > 1 {
        warn!(
            "[Assign] {} feature overlaps zones {:?} equally ({:.3}); assigning to zone {}",
            feature.kind, winners, best_area, winner
        );
    }

    feature.stamp_zone(winner);
    outcome.by_zone.entry(winner).or_default().push(feature);
}

/// Clip the feature to every overlapping zone, exploding multi-part
/// intersections into single polygons. Non-polygonal input cannot be
/// clipped and lands in `malformed`.
fn assign_multi_owner(feature: Feature, candidates: &[&Zone], outcome: &mut AssignmentOutcome) {
    let Some(feature_area) = to_area(&feature.geometry) else {
        outcome.malformed.push(feature.geometry_json());
        return;
    };

    let mut assigned_any = false;
    for zone in candidates {
        let Some(zone_area) = to_area(&zone.geometry) else {
            continue;
        };
        let clipped: MultiPolygon<f64> = zone_area.intersection(&feature_area);
        if clipped.unsigned_area() <= 0.0 {
            continue;
        }

        for part in clipped.0 {
            if part.unsigned_area() <= 0.0 {
                // Degenerate sliver from the clip; record, do not keep
                outcome
                    .malformed
                    .push(crate::geojson::geometry_to_value(&Geometry::Polygon(part)));
                continue;
            }
            let mut piece = match feature.clone().with_geometry(Geometry::Polygon(part)) {
                Ok(piece) => piece,
                Err(_) => continue,
            };
            piece.stamp_zone(zone.id);
            outcome.by_zone.entry(zone.id).or_default().push(piece);
            assigned_any = true;
        }
    }

    if !assigned_any {
        outcome.unassigned.push(feature);
    }
}
