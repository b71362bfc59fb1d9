//! zone-visits - reverse geofence search over recorded fleet history
//!
//! Lists every stay of every selected device inside a circle during a time
//! window, with entry/exit times, entry coordinates and distance from center.
//!
//! Module structure:
//! - `domain/` - Core types (ZoneQuery, PositionFix, DeviceInfo, VisitRecord)
//! - `services/` - Zone scan, aggregation and search orchestration
//! - `io/` - Fleet data store, audit sinks, result egress
//! - `infra/` - Config and metrics
//!
//! Usage:
//!   zone-visits --lat 64.1466 --lon -21.9426 --radius 250 \
//!       --from 2025-03-01T00:00:00Z --to 2025-03-02T00:00:00Z --group 3

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use zone_visits::domain::types::{DeviceId, GeoPoint, GroupId, UserId};
use zone_visits::infra::{Config, OutputFormat, ScanMetrics};
use zone_visits::io::{AuditFanout, FleetStore, JsonlAudit, TracingAudit, VisitEgress};
use zone_visits::services::{AuditLog, PeriodLimit, ReverseSearch, SearchRequest};

/// Reverse geofence search - which devices were inside a circle, and when
#[derive(Parser, Debug)]
#[command(name = "zone-visits", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Zone center latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Zone center longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Zone radius in meters
    #[arg(short, long)]
    radius: f64,

    /// Window start (RFC 3339, inclusive)
    #[arg(long)]
    from: DateTime<Utc>,

    /// Window end (RFC 3339, inclusive)
    #[arg(long)]
    to: DateTime<Utc>,

    /// Restrict to these device IDs (repeatable)
    #[arg(long = "device")]
    devices: Vec<i64>,

    /// Restrict to devices in these groups, subgroups included (repeatable)
    #[arg(long = "group")]
    groups: Vec<i64>,

    /// User ID recorded in the audit trail
    #[arg(long, default_value_t = 0)]
    user: i64,

    /// Fleet data file (overrides store.path)
    #[arg(long)]
    store: Option<String>,

    /// Output path, "-" for stdout (overrides egress.file)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format (overrides egress.format)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Scan devices in parallel (overrides report.parallel)
    #[arg(long)]
    parallel: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), git = env!("GIT_HASH"), "zone_visits_starting");

    let mut config = Config::load_from_path(&args.config);
    if let Some(output) = &args.output {
        config = config.with_egress_file(output);
    }
    if let Some(format) = args.format {
        config = config.with_egress_format(format);
    }
    if args.parallel {
        config = config.with_parallel(true);
    }
    let store_path = args.store.clone().unwrap_or_else(|| config.store_path().to_string());

    info!(
        config_file = %config.config_file(),
        store = %store_path,
        period_limit_secs = %config.period_limit_secs(),
        parallel = %config.parallel(),
        egress_file = %config.egress_file(),
        egress_format = %config.egress_format().as_str(),
        audit_file = ?config.audit_file(),
        "config_loaded"
    );

    let store = Arc::new(
        FleetStore::from_file(&store_path)
            .with_context(|| format!("Failed to load fleet store {store_path}"))?,
    );

    let audit: Arc<dyn AuditLog> = match config.audit_file() {
        Some(file) => Arc::new(AuditFanout::new().with(TracingAudit).with(JsonlAudit::new(file))),
        None => Arc::new(TracingAudit),
    };

    let search = ReverseSearch::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(PeriodLimit::new(config.period_limit_secs())),
        audit,
        Arc::new(ScanMetrics::new()),
    );

    let request = SearchRequest {
        user_id: UserId(args.user),
        device_ids: args.devices.iter().map(|&id| DeviceId(id)).collect(),
        group_ids: args.groups.iter().map(|&id| GroupId(id)).collect(),
        center: GeoPoint::new(args.lat, args.lon),
        radius_m: args.radius,
        from: args.from,
        to: args.to,
    };

    let visits = if config.parallel() {
        search.run_parallel(&request).await?
    } else {
        search.run(&request)?
    };

    VisitEgress::new(config.egress_file(), config.egress_format()).write_visits(&visits)?;

    search.metrics().report().log();
    info!(visits = %visits.len(), "zone_visits_done");
    Ok(())
}
