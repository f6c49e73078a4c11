//! R-tree spatial index over zone bounding boxes.
//!
//! The index holds only `(zone_id, bounding_box)` pairs; materialized
//! zones live in the [`crate::cache::ZoneCache`]. Index entries are
//! never evicted.

use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::envelope;

/// Bounds wrapper for R-tree spatial indexing.
#[derive(Debug, Clone)]
pub struct ZoneBoundsEntry {
    pub zone_id: i64,
    pub bounds: Rect<f64>,
}

impl RTreeObject for ZoneBoundsEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope(&self.bounds)
    }
}

/// Bulk-build the index from `(id, bbox)` pairs (startup path).
pub fn build_index(entries: Vec<ZoneBoundsEntry>) -> RTree<ZoneBoundsEntry> {
    RTree::bulk_load(entries)
}

/// Zone ids whose bounding boxes intersect `rect`.
pub fn candidates_in_rect(index: &RTree<ZoneBoundsEntry>, rect: &Rect<f64>) -> Vec<i64> {
    index
        .locate_in_envelope_intersecting(&envelope(rect))
        .map(|entry| entry.zone_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Rect};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    #[test]
    fn test_candidate_query() {
        let index = build_index(vec![
            ZoneBoundsEntry {
                zone_id: 1,
                bounds: rect(0.0, 0.0, 10.0, 10.0),
            },
            ZoneBoundsEntry {
                zone_id: 2,
                bounds: rect(20.0, 20.0, 30.0, 30.0),
            },
        ]);

        let mut hits = candidates_in_rect(&index, &rect(5.0, 5.0, 25.0, 25.0));
        hits.sort();
        assert_eq!(hits, vec![1, 2]);

        let hits = candidates_in_rect(&index, &rect(50.0, 50.0, 60.0, 60.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_incremental_insert() {
        let mut index = build_index(vec![]);
        index.insert(ZoneBoundsEntry {
            zone_id: 7,
            bounds: rect(0.0, 0.0, 1.0, 1.0),
        });
        assert_eq!(candidates_in_rect(&index, &rect(0.5, 0.5, 0.6, 0.6)), vec![7]);
    }
}
