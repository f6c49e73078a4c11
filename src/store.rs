//! # Spatial Store
//!
//! The facade owning the spatial index, the zone cache, the staging
//! area and the SQLite store behind one process-wide lock, plus the
//! background cache-eviction sweeper.
//!
//! ## Concurrency model
//!
//! Reads (`zone`, `zones`, `zones_by_area`) take the lock only long
//! enough to consult or populate the cache. Imports hold it for their
//! full duration, so two imports against overlapping zones are fully
//! serialized — imports are rare and administrative compared to reads.
//! The sweeper thread wakes on a fixed interval, computes
//! `cutoff = now − expiry` and clears materialized cache entries idle
//! past the cutoff; index entries are never evicted.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use geo::{Area, BooleanOps, MultiPolygon, Polygon};
use log::{info, warn};
use rstar::RTree;
use serde::Serialize;
use serde_json::Value;

use crate::assignment;
use crate::cache::ZoneCache;
use crate::error::{Result, ZoneStoreError};
use crate::feature::{Feature, GeometrySet, GeometryType, RawFeature, Zone, ZoneConfiguration};
use crate::geo_utils::to_area;
use crate::index::{build_index, candidates_in_rect, ZoneBoundsEntry};
use crate::merge;
use crate::persistence::{ConfigIds, GeometryStore};
use crate::staging::StagingArea;

/// Store tuning knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How often the sweeper wakes.
    pub sweep_interval: Duration,
    /// How long a cache entry may sit untouched before eviction.
    pub cache_expiry: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            cache_expiry: Duration::from_secs(3600),
        }
    }
}

/// Counters exposed for monitoring and tests.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub zone_count: usize,
    pub cached_zones: usize,
    pub staged_groups: usize,
}

/// Outcome of one import: the configurations created plus everything
/// that could not be assigned (nothing is silently dropped).
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub group_id: String,
    pub configurations: Vec<ZoneConfiguration>,
    /// GeoJSON geometries of features overlapping no zone.
    pub unassigned: Vec<Value>,
    /// GeoJSON fragments the clipping policy could not keep.
    pub malformed: Vec<Value>,
}

struct StoreInner {
    db: GeometryStore,
    index: RTree<ZoneBoundsEntry>,
    zone_ids: HashSet<i64>,
    cache: ZoneCache,
    staging: StagingArea,
}

struct Sweeper {
    stop: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Zone-scoped spatial geometry store.
///
/// Constructed once at process start, explicitly shut down (or dropped,
/// which shuts down the sweeper too).
pub struct SpatialStore {
    inner: Arc<Mutex<StoreInner>>,
    config: StoreConfig,
    sweeper: Option<Sweeper>,
}

impl SpatialStore {
    /// Open (or create) the store at `path` and rebuild the spatial
    /// index from the zone table.
    pub fn open(path: &str, config: StoreConfig) -> Result<Self> {
        Self::from_db(GeometryStore::open(path)?, config)
    }

    /// In-memory store (for testing).
    pub fn in_memory(config: StoreConfig) -> Result<Self> {
        Self::from_db(GeometryStore::in_memory()?, config)
    }

    /// The sweep/expiry settings this store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn from_db(db: GeometryStore, config: StoreConfig) -> Result<Self> {
        let started = Instant::now();
        let entries = db.load_zone_bounds()?;
        let zone_ids: HashSet<i64> = entries.iter().map(|e| e.zone_id).collect();
        info!(
            "[Store] Built spatial index for {} zones in {:?}",
            entries.len(),
            started.elapsed()
        );

        let inner = Arc::new(Mutex::new(StoreInner {
            db,
            index: build_index(entries),
            zone_ids,
            cache: ZoneCache::new(),
            staging: StagingArea::new(),
        }));
        let sweeper = Self::spawn_sweeper(Arc::clone(&inner), config.clone());
        Ok(Self {
            inner,
            config,
            sweeper: Some(sweeper),
        })
    }

    fn spawn_sweeper(inner: Arc<Mutex<StoreInner>>, config: StoreConfig) -> Sweeper {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(config.sweep_interval) {
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let Some(cutoff) = Instant::now().checked_sub(config.cache_expiry) else {
                        continue;
                    };
                    let Ok(mut inner) = inner.lock() else {
                        break;
                    };
                    inner.cache.evict_older_than(cutoff);
                }
                // Stop signal or dropped sender: exit
                _ => break,
            }
        });
        Sweeper { stop, handle }
    }

    /// Stop the sweeper thread. Idempotent; also invoked by `Drop`.
    pub fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            let _ = sweeper.stop.send(());
            let _ = sweeper.handle.join();
            info!("[Store] Cache sweeper stopped");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| ZoneStoreError::Internal {
            message: "store lock poisoned".to_string(),
        })
    }

    // ========================================================================
    // Zone reads
    // ========================================================================

    /// Materialize a zone. Unknown ids are a data-integrity error, never
    /// a `None`.
    pub fn zone(&self, zone_id: i64) -> Result<Zone> {
        let mut inner = self.lock()?;
        let zones = materialize_zones(&mut inner, &[zone_id])?;
        zones
            .into_values()
            .next()
            .ok_or(ZoneStoreError::ZoneNotFound { zone_id })
    }

    /// Materialize several zones at once (chunked bulk load on misses).
    pub fn zones(&self, zone_ids: &[i64]) -> Result<HashMap<i64, Zone>> {
        let mut inner = self.lock()?;
        materialize_zones(&mut inner, zone_ids)
    }

    /// Zones whose geometry intersects `area` with strictly positive
    /// area. Bounding boxes narrow the candidates, exact intersection
    /// decides.
    pub fn zones_by_area(&self, area: &Polygon<f64>) -> Result<HashMap<i64, Zone>> {
        use geo::BoundingRect;
        let Some(rect) = area.bounding_rect() else {
            return Ok(HashMap::new());
        };
        let query = MultiPolygon(vec![area.clone()]);

        let mut inner = self.lock()?;
        let candidates = candidates_in_rect(&inner.index, &rect);
        let zones = materialize_zones(&mut inner, &candidates)?;
        Ok(zones
            .into_iter()
            .filter(|(_, zone)| match to_area(&zone.geometry) {
                Some(shape) => shape.intersection(&query).unsigned_area() > 0.0,
                None => false,
            })
            .collect())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let inner = self.lock()?;
        Ok(StoreStats {
            zone_count: inner.zone_ids.len(),
            cached_zones: inner.cache.len(),
            staged_groups: inner.staging.group_count(),
        })
    }

    // ========================================================================
    // Zone import (initial city-wide load)
    // ========================================================================

    /// Persist zone features and extend the spatial index incrementally.
    pub fn import_zones(&self, raw: &[RawFeature]) -> Result<Vec<i64>> {
        if let Some(bad) = raw.iter().find(|r| r.kind != GeometryType::Zone) {
            return Err(ZoneStoreError::UnsupportedGeometry {
                message: format!("import_zones received a {} feature", bad.kind),
            });
        }
        let features = raw
            .iter()
            .map(Feature::from_raw)
            .collect::<Result<Vec<_>>>()?;

        let mut inner = self.lock()?;
        let ids = inner.db.insert_zones(&features)?;
        for (feature, id) in features.into_iter().zip(&ids) {
            inner.index.insert(ZoneBoundsEntry {
                zone_id: *id,
                bounds: feature.bounds,
            });
            inner.zone_ids.insert(*id);

            let name = feature
                .properties
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("zone-{}", id));
            inner.cache.insert(Zone {
                id: *id,
                name,
                geometry: feature.geometry,
                bounds: feature.bounds,
                properties: feature.properties,
            });
        }
        info!("[Store] Imported {} zones", ids.len());
        Ok(ids)
    }

    // ========================================================================
    // Staging
    // ========================================================================

    /// Stage boundary features as a named group.
    pub fn stage(&self, raw: &[RawFeature], group_id: Option<String>) -> Result<String> {
        self.lock()?.staging.stage(raw, group_id)
    }

    /// Discard a staged group, returning how many features it held.
    pub fn discard_group(&self, group_id: &str) -> Result<usize> {
        self.lock()?.staging.discard(group_id)
    }

    // ========================================================================
    // Import pipeline
    // ========================================================================

    /// Run the full import over a staged group: spatial assignment,
    /// overlay merge for zones that already have configurations,
    /// chunked persistence, configuration creation and zone counter
    /// updates. Holds the store lock end to end.
    ///
    /// A zone's first configuration is always created as `"Default"`;
    /// a different requested name is logged and overridden.
    pub fn import_group(&self, group_id: &str, config_name: &str) -> Result<ImportReport> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let features = inner.staging.consume(group_id)?;

        // Partition by kind; importable kinds only
        let mut by_kind: HashMap<GeometryType, Vec<Feature>> = HashMap::new();
        for feature in features {
            if feature.kind.single_owner().is_none() {
                return Err(ZoneStoreError::UnsupportedGeometry {
                    message: format!(
                        "group '{}' contains {} features, which cannot be imported",
                        group_id, feature.kind
                    ),
                });
            }
            by_kind.entry(feature.kind).or_default().push(feature);
        }

        // Candidate zones: everything whose bbox touches any staged feature
        let mut candidate_ids: Vec<i64> = by_kind
            .values()
            .flatten()
            .flat_map(|f| candidates_in_rect(&inner.index, &f.bounds))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        candidate_ids.sort_unstable();
        let zones = materialize_zones(inner, &candidate_ids)?;

        // Assignment per kind, empty zones kept so the merge can tell
        // "no new geometry" apart from "cleared"
        let mut new_by_zone: HashMap<i64, GeometrySet> = HashMap::new();
        let mut unassigned: Vec<Value> = Vec::new();
        let mut malformed: Vec<Value> = Vec::new();
        for (kind, features) in by_kind {
            let outcome = assignment::assign(kind, features, &zones, &inner.index, true)?;
            for (zone_id, assigned) in outcome.by_zone {
                let set = new_by_zone.entry(zone_id).or_default();
                for feature in assigned {
                    set.push(feature)?;
                }
            }
            unassigned.extend(outcome.unassigned.iter().map(Feature::geometry_json));
            malformed.extend(outcome.malformed);
        }

        // Merge and persist per zone, in stable id order
        let mut zone_order: Vec<i64> = new_by_zone.keys().copied().collect();
        zone_order.sort_unstable();

        let mut configurations = Vec::new();
        for zone_id in zone_order {
            let new_set = &new_by_zone[&zone_id];
            if new_set.is_empty() {
                // Candidate by bounding box only; nothing landed here
                continue;
            }
            let mut zone = zones
                .get(&zone_id)
                .cloned()
                .ok_or(ZoneStoreError::ZoneNotFound { zone_id })?;

            let final_set = match inner.db.baseline_configuration(zone_id)? {
                Some(baseline_config) => {
                    let baseline = load_geometry_set(&inner.db, &baseline_config)?;
                    merge::merge(zone_id, &baseline, new_set)?
                }
                None => new_set.clone(),
            };

            let mut config_ids = ConfigIds::default();
            for kind in GeometryType::ASSIGNABLE {
                let ids = inner.db.insert_features(kind, final_set.get(kind))?;
                config_ids.set(kind, ids);
            }

            let name = if zone.config_count() == 0 {
                if config_name != "Default" {
                    warn!(
                        "[Store] Zone {} has no configurations; storing '{}' as 'Default'",
                        zone_id, config_name
                    );
                }
                "Default"
            } else {
                config_name
            };
            let config = inner.db.create_configuration(&mut zone, name, &config_ids)?;

            // Write-invalidate: refresh the cache in the same critical section
            inner.cache.insert(zone);
            configurations.push(config);
        }

        info!(
            "[Store] Imported group '{}': {} configurations, {} unassigned, {} malformed",
            group_id,
            configurations.len(),
            unassigned.len(),
            malformed.len()
        );
        Ok(ImportReport {
            group_id: group_id.to_string(),
            configurations,
            unassigned,
            malformed,
        })
    }

    // ========================================================================
    // Configurations
    // ========================================================================

    /// Create a configuration from explicit id lists; counters and the
    /// cached zone are updated in the same critical section.
    pub fn create_configuration(
        &self,
        zone_id: i64,
        name: &str,
        ids: &ConfigIds,
    ) -> Result<ZoneConfiguration> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let mut zone = materialize_zones(inner, &[zone_id])?
            .remove(&zone_id)
            .ok_or(ZoneStoreError::ZoneNotFound { zone_id })?;
        let config = inner.db.create_configuration(&mut zone, name, ids)?;
        inner.cache.insert(zone);
        Ok(config)
    }

    /// All configurations of a zone, in creation order.
    pub fn get_configurations(&self, zone_id: i64) -> Result<Vec<ZoneConfiguration>> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        // Validates the zone id as a side effect
        materialize_zones(inner, &[zone_id])?;
        inner.db.configurations_for_zone(zone_id)
    }

    /// Delete a configuration; with `delete_geometries`, geometry rows
    /// no other configuration of the zone references go with it.
    pub fn delete_configuration(
        &self,
        config_id: i64,
        delete_geometries: bool,
    ) -> Result<ZoneConfiguration> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let config =
            inner
                .db
                .configuration(config_id)?
                .ok_or_else(|| ZoneStoreError::Persistence {
                    message: format!("configuration {} not found", config_id),
                })?;
        let mut zone = materialize_zones(inner, &[config.zone_id])?
            .remove(&config.zone_id)
            .ok_or(ZoneStoreError::ZoneNotFound {
                zone_id: config.zone_id,
            })?;
        let deleted = inner
            .db
            .delete_configuration(&mut zone, &config, delete_geometries)?;
        inner.cache.insert(zone);
        Ok(deleted)
    }

    /// Resolve an explicit `{zone_id → config_id}` selection, verifying
    /// every configuration belongs to its zone.
    pub fn resolve_selection(
        &self,
        selection: &HashMap<i64, i64>,
    ) -> Result<HashMap<i64, ZoneConfiguration>> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let mut resolved = HashMap::with_capacity(selection.len());
        for (&zone_id, &config_id) in selection {
            materialize_zones(inner, &[zone_id])?;
            let config = inner.db.configuration(config_id)?.filter(|c| c.zone_id == zone_id);
            let config = config.ok_or(ZoneStoreError::ConfigurationReference { config_id, zone_id })?;
            resolved.insert(zone_id, config);
        }
        Ok(resolved)
    }

    /// "Use defaults": the baseline configuration of every listed zone.
    pub fn default_selection(&self, zone_ids: &[i64]) -> Result<HashMap<i64, ZoneConfiguration>> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let mut resolved = HashMap::with_capacity(zone_ids.len());
        for &zone_id in zone_ids {
            materialize_zones(inner, &[zone_id])?;
            let config = inner.db.baseline_configuration(zone_id)?.ok_or_else(|| {
                ZoneStoreError::Internal {
                    message: format!("zone {} has no configurations", zone_id),
                }
            })?;
            resolved.insert(zone_id, config);
        }
        Ok(resolved)
    }

    /// Force the bulk chunk size (tests/benchmarks only).
    pub fn set_chunk_size(&self, size: usize) -> Result<()> {
        self.lock()?.db.set_chunk_size(size);
        Ok(())
    }
}

impl Drop for SpatialStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Cache-through zone materialization: validate ids against the index,
/// serve hits from the cache, bulk-load the misses and cache them.
fn materialize_zones(inner: &mut StoreInner, zone_ids: &[i64]) -> Result<HashMap<i64, Zone>> {
    let mut result = HashMap::with_capacity(zone_ids.len());
    let mut misses = Vec::new();
    for &zone_id in zone_ids {
        if !inner.zone_ids.contains(&zone_id) {
            return Err(ZoneStoreError::ZoneNotFound { zone_id });
        }
        match inner.cache.get_cloned(zone_id) {
            Some(zone) => {
                result.insert(zone_id, zone);
            }
            None => misses.push(zone_id),
        }
    }
    for zone in inner.db.load_zones(&misses)? {
        inner.cache.insert(zone.clone());
        result.insert(zone.id, zone);
    }
    Ok(result)
}

/// Load a configuration's geometry, one chunked bulk load per kind.
fn load_geometry_set(db: &GeometryStore, config: &ZoneConfiguration) -> Result<GeometrySet> {
    Ok(GeometrySet {
        buildings: db.load_features(GeometryType::Building, &config.building_ids)?,
        vegetation: db.load_features(GeometryType::Vegetation, &config.vegetation_ids)?,
        landcover: db.load_features(GeometryType::LandCover, &config.landcover_ids)?,
        landuse: db.load_features(GeometryType::LandUse, &config.landuse_ids)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use serde_json::{json, Map};

    fn test_config() -> StoreConfig {
        StoreConfig {
            sweep_interval: Duration::from_millis(10),
            cache_expiry: Duration::from_secs(3600),
        }
    }

    fn zone_raw(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> RawFeature {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::from(name));
        RawFeature {
            kind: GeometryType::Zone,
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]],
            }),
            properties,
        }
    }

    fn building_raw(x: f64, y: f64, size: f64) -> RawFeature {
        RawFeature {
            kind: GeometryType::Building,
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[
                    [x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y],
                ]],
            }),
            properties: Map::new(),
        }
    }

    #[test]
    fn test_zone_lookup_and_not_found() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        let ids = store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();

        let zone = store.zone(ids[0]).unwrap();
        assert_eq!(zone.name, "North");

        assert!(matches!(
            store.zone(9999),
            Err(ZoneStoreError::ZoneNotFound { zone_id: 9999 })
        ));
    }

    #[test]
    fn test_zones_by_area_exact_filter() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        // L-shaped query region overlaps zone 1's bbox but not its geometry
        let ids = store
            .import_zones(&[
                zone_raw("A", 0.0, 0.0, 10.0, 10.0),
                zone_raw("B", 20.0, 0.0, 30.0, 10.0),
            ])
            .unwrap();

        let query = polygon![
            (x: 5.0, y: 5.0),
            (x: 25.0, y: 5.0),
            (x: 25.0, y: 8.0),
            (x: 5.0, y: 8.0),
            (x: 5.0, y: 5.0),
        ];
        let hits = store.zones_by_area(&query).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.contains_key(&ids[0]));
        assert!(hits.contains_key(&ids[1]));

        let outside = polygon![
            (x: 50.0, y: 50.0),
            (x: 60.0, y: 50.0),
            (x: 60.0, y: 60.0),
            (x: 50.0, y: 60.0),
            (x: 50.0, y: 50.0),
        ];
        assert!(store.zones_by_area(&outside).unwrap().is_empty());

        // Touching at a corner is area zero, excluded
        let corner = polygon![
            (x: 10.0, y: 10.0),
            (x: 15.0, y: 10.0),
            (x: 15.0, y: 15.0),
            (x: 10.0, y: 15.0),
            (x: 10.0, y: 10.0),
        ];
        let hits = store.zones_by_area(&corner).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_first_import_creates_default_configuration() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        let zone_ids = store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 100.0, 100.0)])
            .unwrap();

        let group = store
            .stage(&[building_raw(10.0, 10.0, 5.0)], None)
            .unwrap();
        let report = store.import_group(&group, "city-import").unwrap();
        assert_eq!(report.configurations.len(), 1);
        assert_eq!(report.configurations[0].name, "Default");
        assert!(report.unassigned.is_empty());

        let zone = store.zone(zone_ids[0]).unwrap();
        assert_eq!(zone.config_count(), 1);
        assert_eq!(zone.config_details()[0].name, "Default");
    }

    #[test]
    fn test_cache_consistency_after_configuration_create() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        let zone_ids = store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 100.0, 100.0)])
            .unwrap();

        let group = store.stage(&[building_raw(10.0, 10.0, 5.0)], None).unwrap();
        store.import_group(&group, "Default").unwrap();
        let before = store.zone(zone_ids[0]).unwrap().config_count();

        let group = store.stage(&[building_raw(60.0, 60.0, 5.0)], None).unwrap();
        let report = store.import_group(&group, "retrofit").unwrap();
        let new_config = &report.configurations[0];

        let zone = store.zone(zone_ids[0]).unwrap();
        assert_eq!(zone.config_count(), before + 1);
        assert!(zone
            .config_details()
            .iter()
            .any(|d| d.id == new_config.id && d.name == "retrofit"));
    }

    #[test]
    fn test_consumed_group_cannot_import_twice() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 100.0, 100.0)])
            .unwrap();

        let group = store.stage(&[building_raw(10.0, 10.0, 5.0)], None).unwrap();
        store.import_group(&group, "Default").unwrap();
        assert!(matches!(
            store.import_group(&group, "Default"),
            Err(ZoneStoreError::StagingGroupNotFound { .. })
        ));
    }

    #[test]
    fn test_unassigned_reported() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();

        let group = store
            .stage(
                &[building_raw(2.0, 2.0, 2.0), building_raw(500.0, 500.0, 2.0)],
                None,
            )
            .unwrap();
        let report = store.import_group(&group, "Default").unwrap();
        assert_eq!(report.unassigned.len(), 1);
        assert_eq!(report.configurations.len(), 1);
    }

    #[test]
    fn test_selection_resolution() {
        let store = SpatialStore::in_memory(test_config()).unwrap();
        let zone_ids = store
            .import_zones(&[
                zone_raw("A", 0.0, 0.0, 10.0, 10.0),
                zone_raw("B", 20.0, 0.0, 30.0, 10.0),
            ])
            .unwrap();

        let group = store.stage(&[building_raw(2.0, 2.0, 2.0)], None).unwrap();
        let report = store.import_group(&group, "Default").unwrap();
        let config = &report.configurations[0];

        let mut selection = HashMap::new();
        selection.insert(zone_ids[0], config.id);
        let resolved = store.resolve_selection(&selection).unwrap();
        assert_eq!(resolved[&zone_ids[0]].id, config.id);

        // Same configuration referenced from the wrong zone
        let mut bad = HashMap::new();
        bad.insert(zone_ids[1], config.id);
        assert!(matches!(
            store.resolve_selection(&bad),
            Err(ZoneStoreError::ConfigurationReference { .. })
        ));

        let defaults = store.default_selection(&zone_ids[..1]).unwrap();
        assert_eq!(defaults[&zone_ids[0]].name, "Default");
    }

    #[test]
    fn test_sweeper_evicts_idle_entries() {
        let store = SpatialStore::in_memory(StoreConfig {
            sweep_interval: Duration::from_millis(5),
            cache_expiry: Duration::from_millis(1),
        })
        .unwrap();
        let ids = store
            .import_zones(&[zone_raw("North", 0.0, 0.0, 10.0, 10.0)])
            .unwrap();

        store.zone(ids[0]).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(store.stats().unwrap().cached_zones, 0);

        // Still materializable: only the cache entry was evicted
        assert_eq!(store.zone(ids[0]).unwrap().id, ids[0]);
    }
}
