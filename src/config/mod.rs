//! Configuration module
//!
//! Handles finding, loading, validating and saving configuration. Values come
//! from a YAML/JSON file, then `MERCADO_TESTS_*` environment variables, then
//! command-line flags.

mod env;

pub use env::{print_env_help, EnvConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::models::MISSING_ID;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./mercado-tests.yaml",
    "./mercado-tests.yml",
    "./.mercado-tests.yaml",
    "~/.config/mercado-tests/config.yaml",
];

/// Hosted service the suite targets by default
pub const DEFAULT_BASE_URL: &str = "https://api-desafio-qa.onrender.com";

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the API under test
    pub base_url: String,

    /// Path of the mercado collection
    pub resource_path: String,

    /// HTTP timeout in seconds, applied to every request
    pub timeout_secs: u64,

    /// Maximum requests in flight during a fan-out
    pub max_concurrent: usize,

    /// Number of mercados created by the concurrent-create case
    pub fan_out: usize,

    /// Id expected not to exist
    pub missing_id: u64,

    /// Id removed by the delete case; `null` deletes the captured mercado
    pub delete_id: Option<u64>,

    /// Report settings
    pub report: ReportConfig,
}

fn default_delete_id() -> Option<u64> {
    Some(3)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource_path: "/mercado".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: 5,
            fan_out: 5,
            missing_id: MISSING_ID,
            delete_id: default_delete_id(),
            report: ReportConfig::default(),
        }
    }
}

/// Report output configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Console format (table, json, json-pretty, csv, summary)
    pub format: String,

    /// Optional report file
    pub output: Option<PathBuf>,

    /// Colorize console output
    pub color: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            output: None,
            color: true,
        }
    }
}

impl AppConfig {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load from the first standard location, or defaults
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Apply environment overrides
    pub fn merge_env(mut self, env: &EnvConfig) -> Self {
        if let Some(base_url) = &env.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(concurrent) = env.concurrent {
            self.max_concurrent = concurrent;
        }
        if let Some(format) = &env.format {
            self.report.format = format.clone();
        }
        if let Some(output) = &env.output {
            self.report.output = Some(PathBuf::from(output));
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("base_url must use http or https: {}", self.base_url);
        }

        if !self.resource_path.starts_with('/') {
            anyhow::bail!(
                "resource_path must start with '/': {}",
                self.resource_path
            );
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        if self.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be greater than zero");
        }

        if self.fan_out == 0 {
            anyhow::bail!("fan_out must be greater than zero");
        }

        if crate::output::OutputFormat::from_str(&self.report.format).is_none() {
            anyhow::bail!("Unknown report format: {}", self.report.format);
        }

        Ok(())
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.delete_id, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = AppConfig {
            base_url: "http://localhost:3000".into(),
            delete_id: None,
            ..AppConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base_url: http://localhost:8080\nfan_out: 8\n").unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.base_url, "http://localhost:8080");
        assert_eq!(loaded.fan_out, 8);
        assert_eq!(loaded.resource_path, "/mercado");
    }

    #[test]
    fn test_validation_errors() {
        let bad_url = AppConfig {
            base_url: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        assert!(bad_url.validate().is_err());

        let bad_path = AppConfig {
            resource_path: "mercado".into(),
            ..AppConfig::default()
        };
        assert!(bad_path.validate().is_err());

        let zero_timeout = AppConfig {
            timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let mut bad_format = AppConfig::default();
        bad_format.report.format = "xml".into();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_merge_env() {
        let env = EnvConfig {
            base_url: Some("http://staging".into()),
            timeout: Some(5),
            ..Default::default()
        };
        let config = AppConfig::default().merge_env(&env);
        assert_eq!(config.base_url, "http://staging");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrent, 5);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("./x.yaml"), PathBuf::from("./x.yaml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/a/b"), home.join("a/b"));
        }
    }
}
