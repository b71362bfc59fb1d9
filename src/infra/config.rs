//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. Default: config/dev.toml
//!
//! Every section is optional; missing keys fall back to the defaults below.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Output encoding for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Maximum searched window length in seconds (0 = unlimited)
    #[serde(default)]
    pub period_limit_secs: u64,
    /// Scan devices on the blocking thread pool
    #[serde(default)]
    pub parallel: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { period_limit_secs: 0, parallel: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Fleet data file (devices, groups, positions)
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

fn default_store_path() -> String {
    "data/fleet.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// Output path for visits, "-" for stdout
    #[serde(default = "default_egress_file")]
    pub file: String,
    #[serde(default = "default_egress_format")]
    pub format: OutputFormat,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file(), format: default_egress_format() }
    }
}

fn default_egress_file() -> String {
    "-".to_string()
}

fn default_egress_format() -> OutputFormat {
    OutputFormat::Json
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditConfig {
    /// JSONL audit trail; audit entries only go to the log when unset
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    period_limit_secs: u64,
    parallel: bool,
    store_path: String,
    egress_file: String,
    egress_format: OutputFormat,
    audit_file: Option<String>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            period_limit_secs: toml_config.report.period_limit_secs,
            parallel: toml_config.report.parallel,
            store_path: toml_config.store.path,
            egress_file: toml_config.egress.file,
            egress_format: toml_config.egress.format,
            audit_file: toml_config.audit.file,
            config_file,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn period_limit_secs(&self) -> u64 {
        self.period_limit_secs
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn store_path(&self) -> &str {
        &self.store_path
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn egress_format(&self) -> OutputFormat {
        self.egress_format
    }

    pub fn audit_file(&self) -> Option<&str> {
        self.audit_file.as_deref()
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to override the output path (CLI flag)
    pub fn with_egress_file(mut self, file: &str) -> Self {
        self.egress_file = file.to_string();
        self
    }

    /// Builder method to override the output format (CLI flag)
    pub fn with_egress_format(mut self, format: OutputFormat) -> Self {
        self.egress_format = format;
        self
    }

    /// Builder method to force the parallel scan driver (CLI flag)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.period_limit_secs(), 0);
        assert!(!config.parallel());
        assert_eq!(config.store_path(), "data/fleet.json");
        assert_eq!(config.egress_file(), "-");
        assert_eq!(config.egress_format(), OutputFormat::Json);
        assert_eq!(config.audit_file(), None);
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_config: TomlConfig = toml::from_str("[report]\nperiod_limit_secs = 604800\n").unwrap();
        let config = Config::from_toml(toml_config, "inline".to_string());

        assert_eq!(config.period_limit_secs(), 604_800);
        assert_eq!(config.store_path(), "data/fleet.json");
        assert_eq!(config.egress_format(), OutputFormat::Json);
    }

    #[test]
    fn test_format_parse() {
        let toml_config: TomlConfig = toml::from_str("[egress]\nformat = \"jsonl\"\n").unwrap();
        assert_eq!(toml_config.egress.format, OutputFormat::Jsonl);
        assert_eq!(toml_config.egress.file, "-");
        assert_eq!(OutputFormat::Jsonl.as_str(), "jsonl");
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_egress_file("out/visits.jsonl")
            .with_egress_format(OutputFormat::Jsonl)
            .with_parallel(true);

        assert_eq!(config.egress_file(), "out/visits.jsonl");
        assert_eq!(config.egress_format(), OutputFormat::Jsonl);
        assert!(config.parallel());
    }
}
