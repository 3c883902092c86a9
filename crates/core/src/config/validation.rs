//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values after
//! they have been loaded from environment, files, or defaults. A
//! validation failure aborts before any item is processed, never
//! mid-run.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `batch_size`, `max_pages`, or `max_concurrency` is 0
    /// - `max_concurrency` exceeds 16
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - analysis is enabled with a zero call budget or empty endpoint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid { field: "batch_size".into(), reason: "must be greater than 0".into() });
        }

        if self.max_pages == 0 {
            return Err(ConfigError::Invalid { field: "max_pages".into(), reason: "must be greater than 0".into() });
        }

        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_concurrency > 16 {
            return Err(ConfigError::Invalid { field: "max_concurrency".into(), reason: "must not exceed 16".into() });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.analysis.enabled {
            if self.analysis.max_calls == 0 {
                return Err(ConfigError::Invalid {
                    field: "analysis.max_calls".into(),
                    reason: "must be greater than 0 when analysis is enabled".into(),
                });
            }
            if self.analysis.base_url.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "analysis.base_url".into(),
                    reason: "must not be empty when analysis is enabled".into(),
                });
            }
            if self.analysis.model.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "analysis.model".into(),
                    reason: "must not be empty when analysis is enabled".into(),
                });
            }
        }

        Ok(())
    }
}
