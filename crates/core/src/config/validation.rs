//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

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
    /// - `origin` is not an http(s) URL
    /// - `cache_name` or `cache_version` is empty or contains whitespace
    /// - any manifest path or classification prefix is not absolute
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: "must start with http:// or https://".into(),
            });
        }

        for (field, value) in [("cache_name", &self.cache_name), ("cache_version", &self.cache_version)] {
            if value.is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not contain whitespace".into() });
            }
        }

        for path in &self.precache_manifest {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_manifest".into(),
                    reason: format!("path {path:?} must start with /"),
                });
            }
        }

        for prefix in &self.api_prefixes {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "api_prefixes".into(),
                    reason: format!("prefix {prefix:?} must start with /"),
                });
            }
        }

        if !self.static_prefix.starts_with('/') {
            return Err(ConfigError::Invalid { field: "static_prefix".into(), reason: "must start with /".into() });
        }

        if !self.offline_path.starts_with('/') {
            return Err(ConfigError::Invalid { field: "offline_path".into(), reason: "must start with /".into() });
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

        if !self.precache_manifest.contains(&self.offline_path) {
            tracing::warn!(
                offline_path = %self.offline_path,
                "offline_path is not in precache_manifest; \
                 the offline fallback will never be served"
            );
        }

        Ok(())
    }
}
