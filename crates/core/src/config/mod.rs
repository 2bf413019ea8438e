//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LANTERN_*)
//! 2. TOML config file (if LANTERN_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The configuration is constructed once at startup and immutable after
//! that; the controller never re-reads it mid-flight.

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
/// 1. Environment variables (LANTERN_*)
/// 2. TOML config file (if LANTERN_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base origin that manifest paths and relative requests resolve
    /// against.
    ///
    /// Set via LANTERN_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via LANTERN_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name prefix for cache generations.
    ///
    /// Set via LANTERN_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Cache version; bumping it supersedes both generations on the next
    /// activation.
    ///
    /// Set via LANTERN_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Absolute paths pre-cached into the static generation at install.
    ///
    /// Set via LANTERN_PRECACHE_MANIFEST environment variable.
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// Path prefixes classified as API data.
    ///
    /// Set via LANTERN_API_PREFIXES environment variable.
    #[serde(default = "default_api_prefixes")]
    pub api_prefixes: Vec<String>,

    /// Path prefix classified as static assets.
    ///
    /// Set via LANTERN_STATIC_PREFIX environment variable.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,

    /// Reserved offline fallback document path.
    ///
    /// Set via LANTERN_OFFLINE_PATH environment variable.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LANTERN_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via LANTERN_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LANTERN_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./lantern-cache.sqlite")
}

fn default_cache_name() -> String {
    "lantern".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_precache_manifest() -> Vec<String> {
    vec![
        "/".into(),
        "/index.html".into(),
        "/offline.html".into(),
        "/manifest.json".into(),
        "/favicon.ico".into(),
        "/static/css/main.css".into(),
        "/static/js/main.js".into(),
    ]
}

fn default_api_prefixes() -> Vec<String> {
    vec!["/api/".into()]
}

fn default_static_prefix() -> String {
    "/static/".into()
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_user_agent() -> String {
    "lantern/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            db_path: default_db_path(),
            cache_name: default_cache_name(),
            cache_version: default_cache_version(),
            precache_manifest: default_precache_manifest(),
            api_prefixes: default_api_prefixes(),
            static_prefix: default_static_prefix(),
            offline_path: default_offline_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Name of the generation holding pre-cached static assets.
    pub fn static_generation(&self) -> String {
        format!("{}-static-{}", self.cache_name, self.cache_version)
    }

    /// Name of the generation holding lazily cached dynamic responses.
    pub fn dynamic_generation(&self) -> String {
        format!("{}-dynamic-{}", self.cache_name, self.cache_version)
    }

    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LANTERN_`
    /// 2. TOML file from `LANTERN_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("LANTERN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LANTERN_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
