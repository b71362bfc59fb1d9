//! Visit record - one contiguous stay of a device inside the search zone

use crate::domain::types::{DeviceId, DeviceInfo, GroupId, PositionFix, PositionId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A single visit emitted by the scanner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub device_id: DeviceId,
    pub device_name: String,
    pub group_id: Option<GroupId>,
    /// Resolved group name, empty when the device has no (known) group
    pub group_name: String,
    pub entry_time: DateTime<Utc>,
    /// Set by the scan before the record is emitted
    pub exit_time: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters from the zone center at the entry fix
    pub distance_from_center: f64,
    pub position_id: PositionId,
    pub license_plate: Option<String>,
}

impl VisitRecord {
    /// Open a visit at the fix where the device entered the zone.
    ///
    /// Device and group metadata are snapshotted; exit time is left unset.
    pub fn open(device: &DeviceInfo, group_name: &str, entry: &PositionFix, distance_m: f64) -> Self {
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            group_id: device.group_id,
            group_name: group_name.to_string(),
            entry_time: entry.fix_time,
            exit_time: None,
            latitude: entry.latitude,
            longitude: entry.longitude,
            distance_from_center: distance_m,
            position_id: entry.id,
            license_plate: device.license_plate.clone(),
        }
    }

    /// Close the visit at the given time
    #[inline]
    pub fn close(&mut self, exit_time: DateTime<Utc>) {
        self.exit_time = Some(exit_time);
    }

    /// Time spent in the zone, if the visit has been closed
    pub fn duration(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }

    /// Convert to a single-line JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
