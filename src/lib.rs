//! # Zone Store
//!
//! Zone-scoped spatial geometry store with configuration-overlay
//! merging, for urban-climate planning backends.
//!
//! This library provides:
//! - An R-tree spatial index over zone bounding boxes with a
//!   time-evicted cache of materialized zones
//! - Chunked bulk persistence around the storage engine's bound
//!   parameter cap, discovered adaptively once per process
//! - Spatial assignment of staged features to zones (single-owner
//!   max-overlap or multi-owner clipping, by geometry kind)
//! - The overlay merge algorithm that reconciles a zone's baseline
//!   ("Default") configuration with newly supplied partial geometry
//!
//! ## Quick Start
//!
//! ```rust
//! use zone_store::{GeometryType, RawFeature, SpatialStore, StoreConfig};
//! use serde_json::{json, Map};
//!
//! let store = SpatialStore::in_memory(StoreConfig::default()).unwrap();
//!
//! // One city zone
//! let zone = RawFeature {
//!     kind: GeometryType::Zone,
//!     geometry: json!({
//!         "type": "Polygon",
//!         "coordinates": [[[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0], [0.0, 0.0]]],
//!     }),
//!     properties: Map::new(),
//! };
//! let zone_ids = store.import_zones(&[zone]).unwrap();
//!
//! // Stage a building and run the import pipeline
//! let building = RawFeature {
//!     kind: GeometryType::Building,
//!     geometry: json!({
//!         "type": "Polygon",
//!         "coordinates": [[[10.0, 10.0], [15.0, 10.0], [15.0, 15.0], [10.0, 15.0], [10.0, 10.0]]],
//!     }),
//!     properties: Map::new(),
//! };
//! let group = store.stage(&[building], None).unwrap();
//! let report = store.import_group(&group, "Default").unwrap();
//! assert_eq!(report.configurations.len(), 1);
//! assert_eq!(store.zone(zone_ids[0]).unwrap().config_count(), 1);
//! ```

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, ZoneStoreError};

// GeoJSON conversion boundary
pub mod geojson;

// Core data model (features, zones, configurations)
pub mod feature;
pub use feature::{
    ConfigDetail, Feature, GeometrySet, GeometryType, RawFeature, Zone, ZoneConfiguration,
};

// Geometric utilities shared by assignment and merge
pub mod geo_utils;

// R-tree index over zone bounding boxes
pub mod index;
pub use index::ZoneBoundsEntry;

// Time-evicted cache of materialized zones
pub mod cache;
pub use cache::ZoneCache;

// Named in-memory staging groups
pub mod staging;
pub use staging::StagingArea;

// SQLite persistence with chunked bulk I/O
pub mod persistence;
pub use persistence::{ConfigIds, GeometryStore};

// Spatial assignment engine
pub mod assignment;
pub use assignment::{assign, AssignmentOutcome};

// Overlay merge engine
pub mod merge;
pub use merge::merge;

// Store facade: lock, sweeper, import pipeline
pub mod store;
pub use store::{ImportReport, SpatialStore, StoreConfig, StoreStats};
