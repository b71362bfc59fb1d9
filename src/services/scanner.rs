//! Per-device zone membership scan
//!
//! Walks one device's fixes in time order through a two-state machine:
//! - `Outside` (initial) -> `Inside` on the first fix within the radius,
//!   which opens a visit at that fix
//! - `Inside` -> `Outside` on the first fix beyond the radius, which closes
//!   the open visit at that fix's time
//! - a visit still open when the fixes run out is closed at the window end
//!
//! The boundary is inclusive: a fix exactly `radius` meters away is inside.

use crate::domain::query::ZoneQuery;
use crate::domain::types::{DeviceInfo, Group, GroupId, PositionFix, PositionId};
use crate::domain::visit::VisitRecord;
use crate::services::geo::haversine_m;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

/// Visits produced by a single device scan, in entry order
pub type DeviceVisits = SmallVec<[VisitRecord; 2]>;

/// Read-only group name lookup, built once before any device is scanned
#[derive(Debug, Clone, Default)]
pub struct GroupNames {
    names: FxHashMap<GroupId, String>,
}

impl GroupNames {
    pub fn new(groups: impl IntoIterator<Item = Group>) -> Self {
        Self { names: groups.into_iter().map(|g| (g.id, g.name)).collect() }
    }

    /// Name for the group, or "" when the device has none or it is unknown
    pub fn resolve(&self, group_id: Option<GroupId>) -> &str {
        group_id.and_then(|id| self.names.get(&id)).map(String::as_str).unwrap_or("")
    }
}

/// Membership state while walking one device's fixes
#[derive(Debug)]
enum ZoneState {
    Outside,
    Inside {
        /// The single open visit for this device
        visit: VisitRecord,
        /// Most recent in-zone fix
        last_fix: PositionId,
    },
}

/// Result of a per-device scan plus counters for metrics
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub visits: DeviceVisits,
    pub fixes_scanned: usize,
    /// Visits still open at the last fix and closed at the window end
    pub force_closed: usize,
    /// Whether the input had to be re-sorted by fix time
    pub resorted: bool,
}

/// Scans device position histories against one zone query.
///
/// Cheap to clone; the group table is shared so scans can be moved to other
/// threads.
#[derive(Debug, Clone)]
pub struct ZoneScanner {
    query: Arc<ZoneQuery>,
    groups: Arc<GroupNames>,
}

impl ZoneScanner {
    pub fn new(query: ZoneQuery, groups: GroupNames) -> Self {
        Self { query: Arc::new(query), groups: Arc::new(groups) }
    }

    pub fn query(&self) -> &ZoneQuery {
        &self.query
    }

    /// Scan one device's fixes and return its visits in entry order
    pub fn scan_device(&self, device: &DeviceInfo, fixes: Vec<PositionFix>) -> DeviceVisits {
        self.scan_device_with_stats(device, fixes).visits
    }

    /// Same as [`scan_device`](Self::scan_device), also reporting scan counters
    pub fn scan_device_with_stats(
        &self,
        device: &DeviceInfo,
        mut fixes: Vec<PositionFix>,
    ) -> ScanOutcome {
        let resorted = ensure_chronological(&mut fixes);
        if resorted {
            debug!(device_id = %device.id, fixes = %fixes.len(), "fixes_resorted");
        }

        let center = self.query.center();
        let radius = self.query.radius_m();
        let group_name = self.groups.resolve(device.group_id);

        let mut outcome = ScanOutcome { fixes_scanned: fixes.len(), resorted, ..Default::default() };
        let mut state = ZoneState::Outside;

        for fix in &fixes {
            let distance = haversine_m(center, fix.point());
            let inside = distance <= radius;

            state = match (state, inside) {
                (ZoneState::Outside, false) => ZoneState::Outside,
                (ZoneState::Outside, true) => {
                    trace!(
                        device_id = %device.id,
                        position_id = %fix.id,
                        distance_m = %distance,
                        "zone_entry"
                    );
                    let visit = VisitRecord::open(device, group_name, fix, distance);
                    ZoneState::Inside { visit, last_fix: fix.id }
                }
                (ZoneState::Inside { visit, .. }, true) => {
                    ZoneState::Inside { visit, last_fix: fix.id }
                }
                (ZoneState::Inside { mut visit, last_fix }, false) => {
                    trace!(
                        device_id = %device.id,
                        last_inside = %last_fix,
                        position_id = %fix.id,
                        "zone_exit"
                    );
                    visit.close(fix.fix_time);
                    outcome.visits.push(visit);
                    ZoneState::Outside
                }
            };
        }

        if let ZoneState::Inside { mut visit, last_fix } = state {
            debug!(
                device_id = %device.id,
                last_inside = %last_fix,
                "visit_closed_at_window_end"
            );
            visit.close(self.query.to());
            outcome.visits.push(visit);
            outcome.force_closed += 1;
        }

        outcome
    }
}

/// Put fixes in fix-time order, equal times keep their delivery order.
///
/// Returns true if the input was out of order and had to be sorted.
pub fn ensure_chronological(fixes: &mut [PositionFix]) -> bool {
    if fixes.windows(2).all(|w| w[0].fix_time <= w[1].fix_time) {
        return false;
    }
    fixes.sort_by_key(|f| f.fix_time);
    true
}
