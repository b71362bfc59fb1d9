//! File-backed fleet store
//!
//! Loads devices, groups and recorded positions from one JSON document:
//!
//! ```json
//! {
//!   "groups":    [{ "id": 1, "name": "North", "groupId": null }],
//!   "devices":   [{ "id": 7, "name": "Van 7", "groupId": 1, "licensePlate": "AB-123" }],
//!   "positions": [{ "id": 1, "deviceId": 7, "fixTime": "2025-03-01T08:00:00Z",
//!                   "latitude": 48.85, "longitude": 2.35 }]
//! }
//! ```
//!
//! Coordinates are validated on load so malformed fixes never reach a scan.

use crate::domain::types::{DeviceId, DeviceInfo, Group, GroupId, PositionFix};
use crate::error::{DataAccessError, Result};
use crate::services::collaborators::{DeviceDirectory, DeviceFilter, GroupDirectory, PositionStore};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// On-disk layout of the fleet data file
#[derive(Debug, Default, Deserialize)]
pub struct FleetDocument {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub devices: Vec<DeviceInfo>,
    #[serde(default)]
    pub positions: Vec<PositionFix>,
}

/// In-memory fleet data implementing the directory and position collaborators
#[derive(Debug, Default)]
pub struct FleetStore {
    groups: Vec<Group>,
    /// Devices ordered by id
    devices: Vec<DeviceInfo>,
    /// Per-device fixes in file order
    positions: FxHashMap<DeviceId, Vec<PositionFix>>,
}

impl FleetStore {
    /// Load and validate a fleet data file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DataAccessError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| DataAccessError::Io { path: path.to_path_buf(), source })?;
        let document: FleetDocument = serde_json::from_str(&content)
            .map_err(|source| DataAccessError::Parse { path: path.to_path_buf(), source })?;

        let store = Self::from_document(document)?;
        info!(
            path = %path.display(),
            devices = %store.devices.len(),
            groups = %store.groups.len(),
            positions = %store.position_count(),
            "fleet_store_loaded"
        );
        Ok(store)
    }

    /// Build a store from already-parsed data
    pub fn from_document(document: FleetDocument) -> Result<Self, DataAccessError> {
        let FleetDocument { groups, mut devices, positions } = document;

        devices.sort_by_key(|d| d.id);
        if let Some(w) = devices.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(DataAccessError::Malformed(format!("duplicate device id {}", w[0].id)));
        }

        let mut by_device: FxHashMap<DeviceId, Vec<PositionFix>> = FxHashMap::default();
        for fix in positions {
            if !fix.point().is_valid() {
                return Err(DataAccessError::Malformed(format!(
                    "position {} has invalid coordinates ({}, {})",
                    fix.id, fix.latitude, fix.longitude
                )));
            }
            by_device.entry(fix.device_id).or_default().push(fix);
        }

        Ok(Self { groups, devices, positions: by_device })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn position_count(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }

    fn device(&self, id: DeviceId) -> Option<&DeviceInfo> {
        self.devices.binary_search_by_key(&id, |d| d.id).ok().map(|i| &self.devices[i])
    }

    /// The requested groups plus every group nested below them
    fn expand_groups(&self, roots: &[GroupId]) -> Result<FxHashSet<GroupId>, DataAccessError> {
        let mut children: FxHashMap<GroupId, Vec<GroupId>> = FxHashMap::default();
        for group in &self.groups {
            if let Some(parent) = group.group_id {
                children.entry(parent).or_default().push(group.id);
            }
        }

        let mut expanded = FxHashSet::default();
        let mut stack = Vec::with_capacity(roots.len());
        for &root in roots {
            if !self.groups.iter().any(|g| g.id == root) {
                return Err(DataAccessError::UnknownGroup(root));
            }
            stack.push(root);
        }

        while let Some(id) = stack.pop() {
            // insert() returning false also stops parent cycles
            if expanded.insert(id) {
                if let Some(kids) = children.get(&id) {
                    stack.extend(kids.iter().copied());
                }
            }
        }

        Ok(expanded)
    }
}

impl DeviceDirectory for FleetStore {
    fn accessible_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceInfo>> {
        if filter.is_unfiltered() {
            debug!(user_id = %filter.user_id, devices = %self.devices.len(), "devices_unfiltered");
            return Ok(self.devices.clone());
        }

        for &id in &filter.device_ids {
            if self.device(id).is_none() {
                return Err(DataAccessError::UnknownDevice(id).into());
            }
        }
        let groups = self.expand_groups(&filter.group_ids)?;

        let selected: Vec<DeviceInfo> = self
            .devices
            .iter()
            .filter(|d| {
                filter.device_ids.contains(&d.id) || d.group_id.is_some_and(|g| groups.contains(&g))
            })
            .cloned()
            .collect();

        debug!(
            user_id = %filter.user_id,
            requested_devices = ?filter.device_ids,
            requested_groups = ?filter.group_ids,
            devices = %selected.len(),
            "devices_resolved"
        );
        Ok(selected)
    }
}

impl GroupDirectory for FleetStore {
    fn groups(&self) -> Result<Vec<Group>> {
        Ok(self.groups.clone())
    }
}

impl PositionStore for FleetStore {
    fn positions(
        &self,
        device_id: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PositionFix>> {
        let fixes = self
            .positions
            .get(&device_id)
            .map(|fixes| {
                fixes.iter().filter(|f| f.fix_time >= from && f.fix_time <= to).cloned().collect()
            })
            .unwrap_or_default();
        Ok(fixes)
    }
}
