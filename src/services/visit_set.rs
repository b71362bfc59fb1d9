//! Cross-device visit aggregation
//!
//! Per-device scans return their own visit lists; the caller merges them
//! here and takes the globally ordered result at the end.

use crate::domain::visit::VisitRecord;
use std::cmp::Ordering;

/// Result builder collecting visits from any number of device scans
#[derive(Debug, Default)]
pub struct VisitSet {
    visits: Vec<VisitRecord>,
}

impl VisitSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { visits: Vec::with_capacity(capacity) }
    }

    /// Add one device's visits
    pub fn extend(&mut self, visits: impl IntoIterator<Item = VisitRecord>) {
        self.visits.extend(visits);
    }

    /// Merge another builder into this one
    /// Consume the builder, returning visits sorted by entry time.
    ///
    /// Equal entry times are ordered by device id, then entry position id,
    /// so the output does not depend on the order devices were merged in.
    pub fn into_sorted(mut self) -> Vec<VisitRecord> {
        self.visits.sort_by(visit_order);
        self.visits
    }
}

/// Total order used for reported visits
pub fn visit_order(a: &VisitRecord, b: &VisitRecord) -> Ordering {
    a.entry_time
        .cmp(&b.entry_time)
        .then_with(|| a.device_id.cmp(&b.device_id))
        .then_with(|| a.position_id.cmp(&b.position_id))
}
