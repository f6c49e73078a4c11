//! Core data model: geometry types, features, zones and configurations.
//!
//! A [`Feature`] is the atomic unit of the store: one geometry plus an
//! open property map plus a derived bounding box. Zones are features of
//! kind [`GeometryType::Zone`] carrying denormalized configuration
//! counters in their properties so listing a zone's configurations never
//! needs a join.

use geo::{BoundingRect, Geometry, Rect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ZoneStoreError};
use crate::geojson;

/// Closed set of geometry kinds handled by the store.
///
/// The kind determines both the storage table and the merge policy
/// (single-owner vs. multi-owner). `Temp` is staging-only scratch
/// geometry with no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryType {
    Temp,
    Zone,
    LandUse,
    LandCover,
    Building,
    Vegetation,
}

impl GeometryType {
    /// Storage table for this kind, if it has one.
    pub fn table(&self) -> Option<&'static str> {
        match self {
            GeometryType::Temp => None,
            GeometryType::Zone => Some("zone"),
            GeometryType::LandUse => Some("landuse"),
            GeometryType::LandCover => Some("landcover"),
            GeometryType::Building => Some("building"),
            GeometryType::Vegetation => Some("vegetation"),
        }
    }

    /// Whether a feature of this kind belongs to exactly one zone.
    /// `None` for kinds the assignment engine does not accept.
    pub fn single_owner(&self) -> Option<bool> {
        match self {
            GeometryType::Building | GeometryType::Vegetation => Some(true),
            GeometryType::LandUse | GeometryType::LandCover => Some(false),
            GeometryType::Temp | GeometryType::Zone => None,
        }
    }

    /// The four kinds a zone configuration references.
    pub const ASSIGNABLE: [GeometryType; 4] = [
        GeometryType::Building,
        GeometryType::Vegetation,
        GeometryType::LandCover,
        GeometryType::LandUse,
    ];
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryType::Temp => "temp",
            GeometryType::Zone => "zone",
            GeometryType::LandUse => "landuse",
            GeometryType::LandCover => "landcover",
            GeometryType::Building => "building",
            GeometryType::Vegetation => "vegetation",
        };
        write!(f, "{}", name)
    }
}

/// Boundary input shape: a GeoJSON-shaped geometry plus properties,
/// as produced by the upload/import collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeature {
    pub kind: GeometryType,
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// The atomic unit of the store: geometry + properties + derived bounds.
///
/// `id` is `None` while staged and assigned on persistence. Immutable
/// once persisted except for `properties["zone_id"]`, stamped during
/// spatial assignment.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: Option<i64>,
    pub kind: GeometryType,
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
    pub bounds: Rect<f64>,
}

impl Feature {
    /// Build a feature from an in-memory geometry, deriving the bounds.
    pub fn new(
        kind: GeometryType,
        geometry: Geometry<f64>,
        properties: Map<String, Value>,
    ) -> Result<Self> {
        let bounds = geometry
            .bounding_rect()
            .ok_or_else(|| ZoneStoreError::InvalidGeometry {
                message: format!("{} feature has no bounding box (empty geometry)", kind),
            })?;
        Ok(Self {
            id: None,
            kind,
            geometry,
            properties,
            bounds,
        })
    }

    /// Convert boundary input eagerly, failing fast on malformed geometry.
    pub fn from_raw(raw: &RawFeature) -> Result<Self> {
        let geometry = geojson::geometry_from_value(&raw.geometry)?;
        Self::new(raw.kind, geometry, raw.properties.clone())
    }

    /// Replace the feature's geometry, re-deriving the bounds.
    pub fn with_geometry(mut self, geometry: Geometry<f64>) -> Result<Self> {
        self.bounds = geometry
            .bounding_rect()
            .ok_or_else(|| ZoneStoreError::InvalidGeometry {
                message: format!("{} feature reshaped to empty geometry", self.kind),
            })?;
        self.geometry = geometry;
        Ok(self)
    }

    /// Stamp the owning zone into the property map.
    pub fn stamp_zone(&mut self, zone_id: i64) {
        self.properties
            .insert("zone_id".to_string(), Value::from(zone_id));
    }

    /// The stamped owning zone, if any.
    pub fn zone_id(&self) -> Option<i64> {
        self.properties.get("zone_id").and_then(Value::as_i64)
    }

    /// GeoJSON representation of the geometry (persistence boundary).
    pub fn geometry_json(&self) -> Value {
        geojson::geometry_to_value(&self.geometry)
    }
}

/// A `{id, name}` pair denormalized into zone properties so
/// configuration listings avoid a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDetail {
    pub id: i64,
    pub name: String,
}

/// A named spatial partition of the project area; the unit of
/// configuration.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub geometry: Geometry<f64>,
    pub bounds: Rect<f64>,
    pub properties: Map<String, Value>,
}

impl Zone {
    /// Number of configurations attached to this zone.
    pub fn config_count(&self) -> usize {
        self.properties
            .get("config_count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    }

    /// Ordered `{id, name}` pairs of this zone's configurations.
    pub fn config_details(&self) -> Vec<ConfigDetail> {
        self.properties
            .get("config_details")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Append a configuration detail, keeping `config_count` in sync.
    pub fn push_config_detail(&mut self, detail: ConfigDetail) {
        let mut details = self.config_details();
        details.push(detail);
        self.write_details(details);
    }

    /// Remove a configuration detail by id, keeping `config_count` in sync.
    pub fn remove_config_detail(&mut self, config_id: i64) {
        let mut details = self.config_details();
        details.retain(|d| d.id != config_id);
        self.write_details(details);
    }

    fn write_details(&mut self, details: Vec<ConfigDetail>) {
        self.properties
            .insert("config_count".to_string(), Value::from(details.len()));
        self.properties.insert(
            "config_details".to_string(),
            serde_json::to_value(details).unwrap_or(Value::Array(vec![])),
        );
    }
}

/// A named, versioned snapshot of which geometries are active for a
/// zone. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfiguration {
    pub id: i64,
    pub zone_id: i64,
    pub name: String,
    pub landuse_ids: Vec<i64>,
    pub landcover_ids: Vec<i64>,
    pub building_ids: Vec<i64>,
    pub vegetation_ids: Vec<i64>,
}

impl ZoneConfiguration {
    /// The id list for one geometry kind.
    pub fn ids(&self, kind: GeometryType) -> &[i64] {
        match kind {
            GeometryType::LandUse => &self.landuse_ids,
            GeometryType::LandCover => &self.landcover_ids,
            GeometryType::Building => &self.building_ids,
            GeometryType::Vegetation => &self.vegetation_ids,
            GeometryType::Temp | GeometryType::Zone => &[],
        }
    }
}

/// Per-kind feature lists: the currency of the overlay merge engine.
#[derive(Debug, Clone, Default)]
pub struct GeometrySet {
    pub buildings: Vec<Feature>,
    pub vegetation: Vec<Feature>,
    pub landcover: Vec<Feature>,
    pub landuse: Vec<Feature>,
}

impl GeometrySet {
    pub fn get(&self, kind: GeometryType) -> &[Feature] {
        match kind {
            GeometryType::Building => &self.buildings,
            GeometryType::Vegetation => &self.vegetation,
            GeometryType::LandCover => &self.landcover,
            GeometryType::LandUse => &self.landuse,
            GeometryType::Temp | GeometryType::Zone => &[],
        }
    }

    pub fn get_mut(&mut self, kind: GeometryType) -> Option<&mut Vec<Feature>> {
        match kind {
            GeometryType::Building => Some(&mut self.buildings),
            GeometryType::Vegetation => Some(&mut self.vegetation),
            GeometryType::LandCover => Some(&mut self.landcover),
            GeometryType::LandUse => Some(&mut self.landuse),
            GeometryType::Temp | GeometryType::Zone => None,
        }
    }

    pub fn push(&mut self, feature: Feature) -> Result<()> {
        let kind = feature.kind;
        self.get_mut(kind)
            .ok_or_else(|| ZoneStoreError::UnsupportedGeometry {
                message: format!("{} features do not belong in a geometry set", kind),
            })?
            .push(feature);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        GeometryType::ASSIGNABLE
            .iter()
            .all(|k| self.get(*k).is_empty())
    }

    pub fn len(&self) -> usize {
        GeometryType::ASSIGNABLE
            .iter()
            .map(|k| self.get(*k).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_raw(kind: GeometryType) -> RawFeature {
        RawFeature {
            kind,
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]]],
            }),
            properties: Map::new(),
        }
    }

    #[test]
    fn test_feature_from_raw_derives_bounds() {
        let feature = Feature::from_raw(&square_raw(GeometryType::Building)).unwrap();
        assert_eq!(feature.id, None);
        assert_eq!(feature.bounds.min().x, 0.0);
        assert_eq!(feature.bounds.max().y, 4.0);
    }

    #[test]
    fn test_zone_stamp() {
        let mut feature = Feature::from_raw(&square_raw(GeometryType::Building)).unwrap();
        assert_eq!(feature.zone_id(), None);
        feature.stamp_zone(12);
        assert_eq!(feature.zone_id(), Some(12));
    }

    #[test]
    fn test_zone_config_counters_stay_in_sync() {
        let feature = Feature::from_raw(&square_raw(GeometryType::Zone)).unwrap();
        let mut zone = Zone {
            id: 1,
            name: "North".to_string(),
            geometry: feature.geometry.clone(),
            bounds: feature.bounds,
            properties: Map::new(),
        };
        assert_eq!(zone.config_count(), 0);

        zone.push_config_detail(ConfigDetail {
            id: 10,
            name: "Default".to_string(),
        });
        zone.push_config_detail(ConfigDetail {
            id: 11,
            name: "greening".to_string(),
        });
        assert_eq!(zone.config_count(), 2);
        assert_eq!(zone.config_details().len(), 2);

        zone.remove_config_detail(10);
        assert_eq!(zone.config_count(), 1);
        assert_eq!(zone.config_details()[0].name, "greening");
    }

    #[test]
    fn test_geometry_type_policy() {
        assert_eq!(GeometryType::Building.single_owner(), Some(true));
        assert_eq!(GeometryType::LandUse.single_owner(), Some(false));
        assert_eq!(GeometryType::Temp.single_owner(), None);
        assert_eq!(GeometryType::Temp.table(), None);
        assert_eq!(GeometryType::LandCover.table(), Some("landcover"));
    }
}
