//! Reverse search - which devices were inside a circle during a time window
//!
//! Drives the collaborators around the zone scan:
//! 1. validate the query
//! 2. audit the search
//! 3. enforce the report period limit
//! 4. resolve devices and group names
//! 5. scan every device and merge the visits
//!
//! Any failure before the merge aborts the whole search; partial results
//! are never returned. Per-device scan counters reach the metrics only once
//! the whole search has succeeded.

use crate::domain::query::ZoneQuery;
use crate::domain::types::{DeviceId, DeviceInfo, GeoPoint, GroupId, UserId};
use crate::domain::visit::VisitRecord;
use crate::error::Result;
use crate::infra::metrics::ScanMetrics;
use crate::services::collaborators::{
    AuditEntry, AuditLog, DeviceDirectory, DeviceFilter, GroupDirectory, PeriodLimiter,
    PositionStore,
};
use crate::services::scanner::{GroupNames, ScanOutcome, ZoneScanner};
use crate::services::visit_set::VisitSet;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Audit action name for reverse searches
pub const AUDIT_ACTION: &str = "reversesearch";

/// Parameters of one reverse search as received from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub user_id: UserId,
    pub device_ids: Vec<DeviceId>,
    pub group_ids: Vec<GroupId>,
    pub center: GeoPoint,
    pub radius_m: f64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl SearchRequest {
    fn device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            user_id: self.user_id,
            device_ids: self.device_ids.clone(),
            group_ids: self.group_ids.clone(),
        }
    }

    fn audit_entry(&self) -> AuditEntry {
        AuditEntry {
            id: Uuid::now_v7().to_string(),
            action: AUDIT_ACTION,
            user_id: self.user_id,
            from: self.from,
            to: self.to,
            device_ids: self.device_ids.clone(),
            group_ids: self.group_ids.clone(),
            center: self.center,
            radius_m: self.radius_m,
            logged_at: Utc::now(),
        }
    }
}

/// Collaborators a reverse search runs against
#[derive(Clone)]
pub struct ReverseSearch {
    devices: Arc<dyn DeviceDirectory>,
    groups: Arc<dyn GroupDirectory>,
    positions: Arc<dyn PositionStore>,
    limiter: Arc<dyn PeriodLimiter>,
    audit: Arc<dyn AuditLog>,
    metrics: Arc<ScanMetrics>,
}

/// Everything resolved before scanning starts
struct Prepared {
    scanner: ZoneScanner,
    devices: Vec<DeviceInfo>,
}

/// Counters of one device scan, held back until the search completes
#[derive(Debug, Clone, Copy)]
struct DeviceScanStats {
    fixes: usize,
    visits: usize,
    force_closed: usize,
    resorted: bool,
}

/// Merged visits plus the per-device counters behind them
struct Scanned {
    visits: Vec<VisitRecord>,
    stats: Vec<DeviceScanStats>,
}

impl ReverseSearch {
    pub fn new(
        devices: Arc<dyn DeviceDirectory>,
        groups: Arc<dyn GroupDirectory>,
        positions: Arc<dyn PositionStore>,
        limiter: Arc<dyn PeriodLimiter>,
        audit: Arc<dyn AuditLog>,
        metrics: Arc<ScanMetrics>,
    ) -> Self {
        Self { devices, groups, positions, limiter, audit, metrics }
    }

    pub fn metrics(&self) -> &Arc<ScanMetrics> {
        &self.metrics
    }

    /// Run the search, scanning devices one after another
    pub fn run(&self, request: &SearchRequest) -> Result<Vec<VisitRecord>> {
        let started = Instant::now();
        let result = self.run_sequential(request);
        self.finish(request, started, result)
    }

    /// Run the search, scanning each device on the blocking thread pool.
    ///
    /// Positions are fetched up front so every scan task owns its input;
    /// the output is identical to [`run`](Self::run).
    pub async fn run_parallel(&self, request: &SearchRequest) -> Result<Vec<VisitRecord>> {
        let started = Instant::now();
        let result = self.run_concurrent(request).await;
        self.finish(request, started, result)
    }

    fn run_sequential(&self, request: &SearchRequest) -> Result<Scanned> {
        let Prepared { scanner, devices } = self.prepare(request)?;
        let query = scanner.query();

        let mut visits = VisitSet::with_capacity(devices.len());
        let mut stats = Vec::with_capacity(devices.len());
        for device in &devices {
            let fixes = self.positions.positions(device.id, query.from(), query.to())?;
            let outcome = scanner.scan_device_with_stats(device, fixes);
            stats.push(scan_stats(device, &outcome));
            visits.extend(outcome.visits);
        }

        Ok(Scanned { visits: visits.into_sorted(), stats })
    }

    async fn run_concurrent(&self, request: &SearchRequest) -> Result<Scanned> {
        let Prepared { scanner, devices } = self.prepare(request)?;
        let (from, to) = (scanner.query().from(), scanner.query().to());

        let mut inputs = Vec::with_capacity(devices.len());
        for device in devices {
            let fixes = self.positions.positions(device.id, from, to)?;
            inputs.push((device, fixes));
        }

        let mut tasks = JoinSet::new();
        for (device, fixes) in inputs {
            let scanner = scanner.clone();
            tasks.spawn_blocking(move || {
                let outcome = scanner.scan_device_with_stats(&device, fixes);
                (device, outcome)
            });
        }

        let mut visits = VisitSet::with_capacity(tasks.len());
        let mut stats = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (device, outcome) = joined?;
            stats.push(scan_stats(&device, &outcome));
            visits.extend(outcome.visits);
        }

        Ok(Scanned { visits: visits.into_sorted(), stats })
    }

    /// Validate, audit, limit and resolve everything a scan needs
    fn prepare(&self, request: &SearchRequest) -> Result<Prepared> {
        let query = ZoneQuery::new(request.center, request.radius_m, request.from, request.to)?;

        self.audit.record(&request.audit_entry());
        self.limiter.check(query.from(), query.to())?;

        let devices = self.devices.accessible_devices(&request.device_filter())?;
        let groups = GroupNames::new(self.groups.groups()?);

        debug!(
            user_id = %request.user_id,
            devices = %devices.len(),
            radius_m = %query.radius_m(),
            "reverse_search_prepared"
        );

        Ok(Prepared { scanner: ZoneScanner::new(query, groups), devices })
    }

    fn finish(
        &self,
        request: &SearchRequest,
        started: Instant,
        result: Result<Scanned>,
    ) -> Result<Vec<VisitRecord>> {
        let elapsed_us = started.elapsed().as_micros() as u64;
        match result {
            Ok(Scanned { visits, stats }) => {
                for s in &stats {
                    self.metrics.record_device_scan(s.fixes, s.visits, s.force_closed, s.resorted);
                }
                self.metrics.record_search(elapsed_us);
                info!(
                    user_id = %request.user_id,
                    devices = %stats.len(),
                    visits = %visits.len(),
                    elapsed_us = %elapsed_us,
                    "reverse_search_complete"
                );
                Ok(visits)
            }
            Err(e) => {
                self.metrics.record_search_failed();
                warn!(user_id = %request.user_id, error = %e, "reverse_search_failed");
                Err(e)
            }
        }
    }
}

fn scan_stats(device: &DeviceInfo, outcome: &ScanOutcome) -> DeviceScanStats {
    debug!(
        device_id = %device.id,
        fixes = %outcome.fixes_scanned,
        visits = %outcome.visits.len(),
        "device_scanned"
    );
    DeviceScanStats {
        fixes: outcome.fixes_scanned,
        visits: outcome.visits.len(),
        force_closed: outcome.force_closed,
        resorted: outcome.resorted,
    }
}
