//! Domain models - fleet reference data, zone queries and visits
//!
//! This module contains the canonical data types used throughout the crate:
//! - `types` - ID newtypes, `GeoPoint`, `PositionFix`, `DeviceInfo`, `Group`
//! - `query` - `ZoneQuery`, the validated circular zone and time window
//! - `visit` - `VisitRecord`, one stay of a device inside the zone

pub mod query;
pub mod types;
pub mod visit;

// Re-export commonly used types at module level
pub use query::ZoneQuery;
pub use types::{DeviceId, DeviceInfo, GeoPoint, Group, GroupId, PositionFix, PositionId, UserId};
pub use visit::VisitRecord;
