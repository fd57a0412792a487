//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "MERCADO_TESTS";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Base URL from MERCADO_TESTS_BASE_URL
    pub base_url: Option<String>,
    /// Timeout from MERCADO_TESTS_TIMEOUT
    pub timeout: Option<u64>,
    /// Fan-out concurrency from MERCADO_TESTS_CONCURRENT
    pub concurrent: Option<usize>,
    /// Config file from MERCADO_TESTS_CONFIG
    pub config_file: Option<String>,
    /// Output format from MERCADO_TESTS_FORMAT
    pub format: Option<String>,
    /// Report file from MERCADO_TESTS_OUTPUT
    pub output: Option<String>,
    /// Log level from MERCADO_TESTS_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}")).filter(|v| !v.is_empty());

        Self {
            base_url: get("BASE_URL"),
            timeout: get("TIMEOUT").and_then(|v| v.parse().ok()),
            concurrent: get("CONCURRENT").and_then(|v| v.parse().ok()),
            config_file: get("CONFIG"),
            format: get("FORMAT"),
            output: get("OUTPUT"),
            log_level: get("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.base_url.is_some()
            || self.timeout.is_some()
            || self.concurrent.is_some()
            || self.config_file.is_some()
            || self.format.is_some()
            || self.output.is_some()
            || self.log_level.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_BASE_URL:   {:?}", self.base_url);
        println!("  {ENV_PREFIX}_TIMEOUT:    {:?}", self.timeout);
        println!("  {ENV_PREFIX}_CONCURRENT: {:?}", self.concurrent);
        println!("  {ENV_PREFIX}_CONFIG:     {:?}", self.config_file);
        println!("  {ENV_PREFIX}_FORMAT:     {:?}", self.format);
        println!("  {ENV_PREFIX}_OUTPUT:     {:?}", self.output);
        println!("  {ENV_PREFIX}_LOG:        {:?}", self.log_level);
    }
}

/// Print all MERCADO_TESTS environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_BASE_URL    Base URL of the API under test");
    println!("  {ENV_PREFIX}_TIMEOUT     Request timeout in seconds");
    println!("  {ENV_PREFIX}_CONCURRENT  Maximum concurrent requests in a fan-out");
    println!("  {ENV_PREFIX}_CONFIG      Path to configuration file");
    println!("  {ENV_PREFIX}_FORMAT      Output format (table, json, json-pretty, csv, summary)");
    println!("  {ENV_PREFIX}_OUTPUT      Report file path");
    println!("  {ENV_PREFIX}_LOG         Log level (trace, debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_BASE_URL=http://localhost:3000");
    println!("  mercado-tests run");
}
