//! Visit egress - writes search results to a file or stdout
//!
//! `json` writes one pretty-printed array, `jsonl` one visit per line.
//! The target "-" means stdout.

use crate::domain::visit::VisitRecord;
use crate::infra::config::OutputFormat;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Egress writer for visit results
pub struct VisitEgress {
    target: String,
    format: OutputFormat,
}

impl VisitEgress {
    pub fn new(target: &str, format: OutputFormat) -> Self {
        debug!(output = %target, format = %format.as_str(), "egress_initialized");
        Self { target: target.to_string(), format }
    }

    #[inline]
    pub fn is_stdout(&self) -> bool {
        self.target == "-"
    }

    /// Write all visits, replacing any previous file content
    pub fn write_visits(&self, visits: &[VisitRecord]) -> anyhow::Result<()> {
        if self.is_stdout() {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            self.encode(visits, &mut out).context("Failed to write visits to stdout")?;
            return Ok(());
        }

        let path = Path::new(&self.target);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.encode(visits, &mut writer)
            .with_context(|| format!("Failed to write visits to {}", path.display()))?;

        info!(
            file = %path.display(),
            format = %self.format.as_str(),
            visits = %visits.len(),
            "visits_egressed"
        );
        Ok(())
    }

    /// Encode visits in the configured format
    pub fn encode<W: Write>(&self, visits: &[VisitRecord], writer: &mut W) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, visits)?;
                writeln!(writer)?;
            }
            OutputFormat::Jsonl => {
                for visit in visits {
                    writeln!(writer, "{}", visit.to_json())?;
                }
            }
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DeviceId, DeviceInfo, PositionFix, PositionId};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::tempdir;

    fn visits() -> Vec<VisitRecord> {
        (0..3)
            .map(|i| {
                let device = DeviceInfo {
                    id: DeviceId(i),
                    name: format!("Van {i}"),
                    group_id: None,
                    license_plate: None,
                };
                let fix = PositionFix {
                    id: PositionId(100 + i),
                    device_id: DeviceId(i),
                    fix_time: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
                    latitude: 10.0,
                    longitude: 20.0,
                };
                let mut visit = VisitRecord::open(&device, "", &fix, 5.0);
                visit.close(fix.fix_time + chrono::Duration::minutes(10));
                visit
            })
            .collect()
    }

    #[test]
    fn test_encode_json_array() {
        let egress = VisitEgress::new("-", OutputFormat::Json);
        let mut buf = Vec::new();
        egress.encode(&visits(), &mut buf).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(parsed[2]["deviceName"], "Van 2");
        assert!(egress.is_stdout());
    }

    #[test]
    fn test_encode_jsonl_lines() {
        let egress = VisitEgress::new("-", OutputFormat::Jsonl);
        let mut buf = Vec::new();
        egress.encode(&visits(), &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed["exitTime"].is_string());
        }
    }

    #[test]
    fn test_encode_empty_json() {
        let egress = VisitEgress::new("-", OutputFormat::Json);
        let mut buf = Vec::new();
        egress.encode(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "[]");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("visits.jsonl");
        let egress = VisitEgress::new(path.to_str().unwrap(), OutputFormat::Jsonl);

        egress.write_visits(&visits()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_write_truncates_previous_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("visits.jsonl");
        fs::write(&path, "old\nold\nold\nold\nold\n").unwrap();
        let egress = VisitEgress::new(path.to_str().unwrap(), OutputFormat::Jsonl);

        egress.write_visits(&visits()[..1]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
