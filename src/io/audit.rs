//! Audit sinks for executed reverse searches
//!
//! Audit is fire-and-forget: write failures are logged and swallowed so an
//! unavailable audit file never fails a search.

use crate::services::collaborators::{AuditEntry, AuditLog};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Emits each audit entry as a structured log event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn record(&self, entry: &AuditEntry) {
        info!(
            audit_id = %entry.id,
            action = %entry.action,
            user_id = %entry.user_id,
            from = %entry.from.to_rfc3339(),
            to = %entry.to.to_rfc3339(),
            device_ids = ?entry.device_ids,
            group_ids = ?entry.group_ids,
            latitude = %entry.center.latitude,
            longitude = %entry.center.longitude,
            radius_m = %entry.radius_m,
            "audit"
        );
    }
}

/// Appends audit entries to a JSONL file (one JSON object per line)
#[derive(Debug, Clone)]
pub struct JsonlAudit {
    file_path: PathBuf,
}

impl JsonlAudit {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        info!(file_path = %file_path.display(), "audit_file_initialized");
        Self { file_path }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path.display(), bytes = %line.len(), "audit_written");
        Ok(())
    }
}

impl AuditLog for JsonlAudit {
    fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                error!(audit_id = %entry.id, error = %e, "audit_serialize_failed");
                return;
            }
        };

        if let Err(e) = self.append_line(&line) {
            error!(
                audit_id = %entry.id,
                file = %self.file_path.display(),
                error = %e,
                "audit_write_failed"
            );
        }
    }
}

/// Forwards every entry to several sinks in order
#[derive(Default)]
pub struct AuditFanout {
    sinks: Vec<Box<dyn AuditLog>>,
}

impl AuditFanout {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink
    pub fn with<A: AuditLog + 'static>(mut self, sink: A) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl AuditLog for AuditFanout {
    fn record(&self, entry: &AuditEntry) {
        for sink in &self.sinks {
            sink.record(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DeviceId, GeoPoint, GroupId, UserId};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::tempdir;

    fn entry(id: &str) -> AuditEntry {
        AuditEntry {
            id: id.to_string(),
            action: "reversesearch",
            user_id: UserId(7),
            from: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
            device_ids: vec![DeviceId(1)],
            group_ids: vec![GroupId(2)],
            center: GeoPoint::new(64.1, -21.9),
            radius_m: 150.0,
            logged_at: Utc.with_ymd_and_hms(2025, 3, 2, 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_jsonl_audit_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let audit = JsonlAudit::new(&path);

        audit.record(&entry("a"));
        audit.record(&entry("b"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["id"], "a");
        assert_eq!(parsed["action"], "reversesearch");
        assert_eq!(parsed["userId"], 7);
        assert_eq!(parsed["deviceIds"], serde_json::json!([1]));
        assert_eq!(parsed["radiusM"], 150.0);
    }

    #[test]
    fn test_jsonl_audit_write_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for append
        let audit = JsonlAudit::new(dir.path());
        audit.record(&entry("a"));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let fanout = AuditFanout::new().with(TracingAudit).with(JsonlAudit::new(&path));

        fanout.record(&entry("x"));

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
