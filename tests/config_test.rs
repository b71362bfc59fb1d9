//! Integration tests for configuration loading

use std::io::Write;
use tempfile::NamedTempFile;
use zone_visits::infra::{Config, OutputFormat};

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[report]
period_limit_secs = 604800
parallel = true

[store]
path = "/var/lib/fleet/fleet.json"

[egress]
file = "out/visits.jsonl"
format = "jsonl"

[audit]
file = "logs/audit.jsonl"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.period_limit_secs(), 604_800);
    assert!(config.parallel());
    assert_eq!(config.store_path(), "/var/lib/fleet/fleet.json");
    assert_eq!(config.egress_file(), "out/visits.jsonl");
    assert_eq!(config.egress_format(), OutputFormat::Jsonl);
    assert_eq!(config.audit_file(), Some("logs/audit.jsonl"));
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_partial_config_keeps_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[report]\nperiod_limit_secs = 3600\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.period_limit_secs(), 3600);
    assert!(!config.parallel());
    assert_eq!(config.store_path(), "data/fleet.json");
    assert_eq!(config.egress_file(), "-");
    assert_eq!(config.egress_format(), OutputFormat::Json);
    assert_eq!(config.audit_file(), None);
}

#[test]
fn test_invalid_config_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[egress]\nformat = \"xml\"\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.period_limit_secs(), 0);
    assert_eq!(config.egress_format(), OutputFormat::Json);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_cli_overrides() {
    let config = Config::default()
        .with_egress_file("visits.json")
        .with_egress_format(OutputFormat::Jsonl)
        .with_parallel(true);

    assert_eq!(config.egress_file(), "visits.json");
    assert_eq!(config.egress_format(), OutputFormat::Jsonl);
    assert!(config.parallel());
}
