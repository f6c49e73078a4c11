//! Unified error handling for the zone-store library.
//!
//! This module provides a consistent error type for all store operations,
//! replacing mixed error handling patterns (Option, panic, silent failures).

use std::fmt;

/// Unified error type for zone-store operations.
#[derive(Debug, Clone)]
pub enum ZoneStoreError {
    /// A staged group id was unknown or already consumed
    StagingGroupNotFound { group_id: String },
    /// A zone id was absent from the spatial index (index/store divergence)
    ZoneNotFound { zone_id: i64 },
    /// The adaptive probe could not establish a positive batch size
    ChunkSizeUnavailable { message: String },
    /// A geometry kind the assignment engine does not handle, or an
    /// entirely non-polygonal clipping batch
    UnsupportedGeometry { message: String },
    /// A configuration selection named a configuration id that does not
    /// belong to the referenced zone
    ConfigurationReference { config_id: i64, zone_id: i64 },
    /// Malformed input geometry (bad GeoJSON, empty shape)
    InvalidGeometry { message: String },
    /// Persistence/storage error
    Persistence { message: String },
    /// Generic internal error
    Internal { message: String },
}

impl fmt::Display for ZoneStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneStoreError::StagingGroupNotFound { group_id } => {
                write!(
                    f,
                    "Staging group '{}' not found or already consumed",
                    group_id
                )
            }
            ZoneStoreError::ZoneNotFound { zone_id } => {
                write!(f, "Zone {} not present in the spatial index", zone_id)
            }
            ZoneStoreError::ChunkSizeUnavailable { message } => {
                write!(f, "Could not establish bulk chunk size: {}", message)
            }
            ZoneStoreError::UnsupportedGeometry { message } => {
                write!(f, "Unsupported geometry: {}", message)
            }
            ZoneStoreError::ConfigurationReference { config_id, zone_id } => {
                write!(
                    f,
                    "Configuration {} does not belong to zone {}",
                    config_id, zone_id
                )
            }
            ZoneStoreError::InvalidGeometry { message } => {
                write!(f, "Invalid geometry: {}", message)
            }
            ZoneStoreError::Persistence { message } => {
                write!(f, "Persistence error: {}", message)
            }
            ZoneStoreError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ZoneStoreError {}

impl From<rusqlite::Error> for ZoneStoreError {
    fn from(err: rusqlite::Error) -> Self {
        ZoneStoreError::Persistence {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ZoneStoreError {
    fn from(err: serde_json::Error) -> Self {
        ZoneStoreError::Persistence {
            message: format!("JSON: {}", err),
        }
    }
}

/// Result type alias for zone-store operations.
pub type Result<T> = std::result::Result<T, ZoneStoreError>;

/// Extension trait for converting Option to ZoneStoreError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a zone-not-found error.
    fn ok_or_zone_not_found(self, zone_id: i64) -> Result<T>;

    /// Convert Option to Result with generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_zone_not_found(self, zone_id: i64) -> Result<T> {
        self.ok_or(ZoneStoreError::ZoneNotFound { zone_id })
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| ZoneStoreError::Internal {
            message: message.to_string(),
        })
    }
}
