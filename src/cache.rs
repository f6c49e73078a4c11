//! # Zone Cache
//!
//! Lazily-populated cache of materialized [`Zone`] objects with
//! last-access stamping. Unlike a capacity-bounded LRU, eviction here is
//! time-based: a background sweep clears every entry not touched since a
//! cutoff, while the spatial index keeps its `(id, bbox)` entry so the
//! zone can be re-materialized on the next access.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;

use crate::feature::Zone;

#[derive(Debug)]
struct CacheSlot {
    zone: Zone,
    last_access: Instant,
}

/// Mutex-guarded by the owning store; the cache itself is plain data.
#[derive(Debug, Default)]
pub struct ZoneCache {
    entries: HashMap<i64, CacheSlot>,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Get a zone, stamping its access time.
    pub fn get(&mut self, zone_id: i64) -> Option<&Zone> {
        if let Some(slot) = self.entries.get_mut(&zone_id) {
            slot.last_access = Instant::now();
            Some(&slot.zone)
        } else {
            None
        }
    }

    /// Get a cloned zone (useful when the borrow must not be held).
    pub fn get_cloned(&mut self, zone_id: i64) -> Option<Zone> {
        self.get(zone_id).cloned()
    }

    /// Insert or refresh a materialized zone.
    pub fn insert(&mut self, zone: Zone) {
        self.entries.insert(
            zone.id,
            CacheSlot {
                zone,
                last_access: Instant::now(),
            },
        );
    }

    /// Drop a specific entry (write-invalidate path).
    pub fn invalidate(&mut self, zone_id: i64) {
        self.entries.remove(&zone_id);
    }

    /// Evict every entry whose last access predates `cutoff`.
    /// Returns the number of entries cleared.
    pub fn evict_older_than(&mut self, cutoff: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.last_access >= cutoff);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!("[Cache] Evicted {} idle zone entries", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, zone_id: i64) -> bool {
        self.entries.contains_key(&zone_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
