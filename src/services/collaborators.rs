//! Interfaces to the systems a reverse search depends on
//!
//! Device, group and position retrieval, period limiting and audit logging
//! are provided by the caller. `io::store::FleetStore`, `services::period_limit`
//! and `io::audit` hold the implementations shipped with this crate.

use crate::domain::types::{DeviceId, DeviceInfo, GeoPoint, Group, GroupId, PositionFix, UserId};
use crate::error::{Result, ValidationError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Device selection for a search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceFilter {
    pub user_id: UserId,
    /// Explicit devices; empty together with `group_ids` means "all"
    pub device_ids: Vec<DeviceId>,
    pub group_ids: Vec<GroupId>,
}

impl DeviceFilter {
    #[inline]
    pub fn is_unfiltered(&self) -> bool {
        self.device_ids.is_empty() && self.group_ids.is_empty()
    }
}

/// Resolves which devices a search covers. Output is trusted as-is.
pub trait DeviceDirectory: Send + Sync {
    fn accessible_devices(&self, filter: &DeviceFilter) -> Result<Vec<DeviceInfo>>;
}

/// Lists all groups for group-name resolution
pub trait GroupDirectory: Send + Sync {
    fn groups(&self) -> Result<Vec<Group>>;
}

/// Recorded positions of one device within an inclusive time window.
///
/// Ordering of the returned fixes is not guaranteed.
pub trait PositionStore: Send + Sync {
    fn positions(
        &self,
        device_id: DeviceId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PositionFix>>;
}

/// Rejects time windows longer than the allowed report period
pub trait PeriodLimiter: Send + Sync {
    fn check(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), ValidationError>;
}

/// Record of an executed reverse search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// UUIDv7, time-sortable
    pub id: String,
    pub action: &'static str,
    pub user_id: UserId,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub device_ids: Vec<DeviceId>,
    pub group_ids: Vec<GroupId>,
    pub center: GeoPoint,
    pub radius_m: f64,
    pub logged_at: DateTime<Utc>,
}

/// Fire-and-forget audit sink
pub trait AuditLog: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}
