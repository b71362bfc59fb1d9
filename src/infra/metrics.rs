//! Lock-free scan metrics
//!
//! Counters are plain atomics so parallel device scans can record without
//! contention. `report()` swaps the per-report histogram back to zero.
//!
//! NOTE: All atomics use Relaxed ordering intentionally; these are statistical
//! counters only and must not drive control flow.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Exponential bucket boundaries for search latency (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64) * percentile).ceil() as u64;
    let mut cumulative = 0u64;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return if i < BUCKET_BOUNDS.len() { BUCKET_BOUNDS[i] } else { BUCKET_BOUNDS[9] * 2 };
        }
    }
    BUCKET_BOUNDS[9] * 2
}

/// Counters for reverse searches and the device scans inside them
#[derive(Debug)]
pub struct ScanMetrics {
    /// Searches that returned a result (monotonic)
    searches_total: AtomicU64,
    /// Searches rejected by validation or a collaborator failure (monotonic)
    searches_failed: AtomicU64,
    devices_scanned: AtomicU64,
    fixes_scanned: AtomicU64,
    visits_emitted: AtomicU64,
    /// Visits still open at the last fix and closed at the window end
    visits_force_closed: AtomicU64,
    /// Device histories that arrived out of fix-time order
    devices_resorted: AtomicU64,
    /// Search latency histogram (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    latency_sum_us: AtomicU64,
    latency_max_us: AtomicU64,
    searches_since_report: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            searches_total: AtomicU64::new(0),
            searches_failed: AtomicU64::new(0),
            devices_scanned: AtomicU64::new(0),
            fixes_scanned: AtomicU64::new(0),
            visits_emitted: AtomicU64::new(0),
            visits_force_closed: AtomicU64::new(0),
            devices_resorted: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            searches_since_report: AtomicU64::new(0),
        }
    }

    /// Record one finished device scan
    #[inline]
    pub fn record_device_scan(&self, fixes: usize, visits: usize, force_closed: usize, resorted: bool) {
        self.devices_scanned.fetch_add(1, Ordering::Relaxed);
        self.fixes_scanned.fetch_add(fixes as u64, Ordering::Relaxed);
        self.visits_emitted.fetch_add(visits as u64, Ordering::Relaxed);
        self.visits_force_closed.fetch_add(force_closed as u64, Ordering::Relaxed);
        if resorted {
            self.devices_resorted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed search and its end-to-end latency
    #[inline]
    pub fn record_search(&self, latency_us: u64) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        self.searches_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_search_failed(&self) {
        self.searches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn searches_total(&self) -> u64 {
        self.searches_total.load(Ordering::Relaxed)
    }

    pub fn searches_failed(&self) -> u64 {
        self.searches_failed.load(Ordering::Relaxed)
    }

    pub fn devices_scanned(&self) -> u64 {
        self.devices_scanned.load(Ordering::Relaxed)
    }

    pub fn fixes_scanned(&self) -> u64 {
        self.fixes_scanned.load(Ordering::Relaxed)
    }

    pub fn visits_emitted(&self) -> u64 {
        self.visits_emitted.load(Ordering::Relaxed)
    }

    pub fn visits_force_closed(&self) -> u64 {
        self.visits_force_closed.load(Ordering::Relaxed)
    }

    pub fn devices_resorted(&self) -> u64 {
        self.devices_resorted.load(Ordering::Relaxed)
    }

    /// Snapshot totals and drain the latency histogram
    pub fn report(&self) -> MetricsSummary {
        let buckets = swap_buckets(&self.latency_buckets);
        let searches = self.searches_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);

        MetricsSummary {
            searches_total: self.searches_total(),
            searches_failed: self.searches_failed(),
            devices_scanned: self.devices_scanned(),
            fixes_scanned: self.fixes_scanned(),
            visits_emitted: self.visits_emitted(),
            visits_force_closed: self.visits_force_closed(),
            devices_resorted: self.devices_resorted(),
            avg_latency_us: if searches > 0 { latency_sum / searches } else { 0 },
            max_latency_us: latency_max,
            lat_p50_us: percentile_from_buckets(&buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&buckets, 0.99),
        }
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the scan metrics
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub searches_total: u64,
    pub searches_failed: u64,
    pub devices_scanned: u64,
    pub fixes_scanned: u64,
    pub visits_emitted: u64,
    pub visits_force_closed: u64,
    pub devices_resorted: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            searches_total = %self.searches_total,
            searches_failed = %self.searches_failed,
            devices_scanned = %self.devices_scanned,
            fixes_scanned = %self.fixes_scanned,
            visits_emitted = %self.visits_emitted,
            visits_force_closed = %self.visits_force_closed,
            devices_resorted = %self.devices_resorted,
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}
