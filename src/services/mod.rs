//! Services - the zone scan and the search around it
//!
//! This module contains the core business logic:
//! - `geo` - Haversine great-circle distance
//! - `scanner` - Per-device entry/exit scan against one zone
//! - `visit_set` - Cross-device merge and global ordering of visits
//! - `collaborators` - Traits for device, group and position lookup, period
//!   limiting and audit
//! - `period_limit` - Configured maximum search window
//! - `reverse_search` - Orchestrates a full search over the collaborators

pub mod collaborators;
pub mod geo;
pub mod period_limit;
pub mod reverse_search;
pub mod scanner;
pub mod visit_set;

// Re-export commonly used types
pub use collaborators::{
    AuditEntry, AuditLog, DeviceDirectory, DeviceFilter, GroupDirectory, PeriodLimiter,
    PositionStore,
};
pub use period_limit::PeriodLimit;
pub use reverse_search::{ReverseSearch, SearchRequest};
pub use scanner::{GroupNames, ZoneScanner};
pub use visit_set::VisitSet;
