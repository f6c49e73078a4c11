//! # Temporary Staging Area
//!
//! Named, in-memory groups of not-yet-persisted features; the entry
//! point for every import. Conversion from boundary input happens
//! eagerly so malformed geometry fails the staging call, not the import
//! hours later. Groups are pure memory, independent of the persistent
//! store, and never expire implicitly.

use std::collections::HashMap;

use log::info;

use crate::error::{Result, ZoneStoreError};
use crate::feature::{Feature, RawFeature};

#[derive(Debug, Default)]
pub struct StagingArea {
    groups: HashMap<String, Vec<Feature>>,
    next_group: u64,
}

impl StagingArea {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            next_group: 0,
        }
    }

    /// Stage a batch of boundary features under `group_id` (generated
    /// when `None`). Fails fast on the first malformed geometry; nothing
    /// is staged in that case.
    pub fn stage(&mut self, raw: &[RawFeature], group_id: Option<String>) -> Result<String> {
        let features = raw
            .iter()
            .map(Feature::from_raw)
            .collect::<Result<Vec<_>>>()?;

        let group_id = group_id.unwrap_or_else(|| {
            self.next_group += 1;
            format!("staged-{}", self.next_group)
        });

        info!(
            "[Staging] Staged {} features as group '{}'",
            features.len(),
            group_id
        );
        self.groups
            .entry(group_id.clone())
            .or_default()
            .extend(features);
        Ok(group_id)
    }

    /// Remove and return a group's features; consumption is one-shot.
    pub fn consume(&mut self, group_id: &str) -> Result<Vec<Feature>> {
        self.groups
            .remove(group_id)
            .ok_or_else(|| ZoneStoreError::StagingGroupNotFound {
                group_id: group_id.to_string(),
            })
    }

    /// Discard a group, returning how many features it held.
    pub fn discard(&mut self, group_id: &str) -> Result<usize> {
        let features =
            self.groups
                .remove(group_id)
                .ok_or_else(|| ZoneStoreError::StagingGroupNotFound {
                    group_id: group_id.to_string(),
                })?;
        info!(
            "[Staging] Discarded group '{}' ({} features)",
            group_id,
            features.len()
        );
        Ok(features.len())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
