//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for
//! layered configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGECHECK_*)
//! 2. TOML config file (if PAGECHECK_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Validation runs once, before any item is processed; a rejected
//! configuration is the only fatal condition in the system.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGECHECK_*)
/// 2. TOML config file (if PAGECHECK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite record cache.
    ///
    /// Set via PAGECHECK_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory for the JSONL and CSV report files.
    ///
    /// Set via PAGECHECK_REPORTS_DIR environment variable.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PAGECHECK_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page fetch timeout in milliseconds.
    ///
    /// Set via PAGECHECK_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per page.
    ///
    /// Set via PAGECHECK_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Pages per batch for progress reporting.
    ///
    /// Set via PAGECHECK_BATCH_SIZE environment variable.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum pages to process in one run.
    ///
    /// Set via PAGECHECK_MAX_PAGES environment variable.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum concurrent in-flight items within a batch.
    ///
    /// Set via PAGECHECK_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Tone-analysis gateway settings.
    ///
    /// Set via PAGECHECK_ANALYSIS__* environment variables.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Settings for the optional external tone-analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Whether the analysis stage runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hard ceiling on analysis calls per run.
    #[serde(default = "default_max_calls")]
    pub max_calls: u32,

    /// Base URL of the model endpoint.
    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,

    /// Model name passed to the endpoint.
    #[serde(default = "default_analysis_model")]
    pub model: String,

    /// Analysis call timeout in milliseconds.
    #[serde(default = "default_analysis_timeout_ms")]
    pub timeout_ms: u64,

    /// Input text is truncated to this many characters before the call.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pagecheck-cache.sqlite")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_user_agent() -> String {
    "pagecheck/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_batch_size() -> usize {
    20
}

fn default_max_pages() -> usize {
    200
}

fn default_max_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_max_calls() -> u32 {
    200
}

fn default_analysis_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_analysis_model() -> String {
    "llama3.1:8b-instruct".into()
}

fn default_analysis_timeout_ms() -> u64 {
    30_000
}

fn default_max_input_chars() -> usize {
    1200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            reports_dir: default_reports_dir(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            batch_size: default_batch_size(),
            max_pages: default_max_pages(),
            max_concurrency: default_max_concurrency(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_calls: default_max_calls(),
            base_url: default_analysis_base_url(),
            model: default_analysis_model(),
            timeout_ms: default_analysis_timeout_ms(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl AppConfig {
    /// Fetch timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGECHECK_`
    /// 2. TOML file from `PAGECHECK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGECHECK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PAGECHECK_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

impl AnalysisConfig {
    /// Analysis call timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./pagecheck-cache.sqlite"));
        assert_eq!(config.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.user_agent, "pagecheck/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.max_pages, 200);
        assert_eq!(config.max_concurrency, 4);
        assert!(config.analysis.enabled);
        assert_eq!(config.analysis.max_calls, 200);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.analysis.timeout(), Duration::from_millis(30_000));
    }
}
