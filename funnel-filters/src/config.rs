//! Configuration loading for the funnel filter builder.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use funnel_http::{CacheConfig, HttpRequest};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FiltersConfig {
    pub catalog: CatalogConfig,
    pub http: HttpConfig,
    pub cache: CacheSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub url: String,
    pub cache_key: String,
    pub cache_max_age_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    pub max_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (set FUNNEL_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl FiltersConfig {
    /// Load from the file named by `FUNNEL_CONFIG`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_env().ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: FiltersConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.url",
                reason: "must not be empty".to_string(),
            });
        }
        if let Err(err) = HttpRequest::get(&self.catalog.url) {
            return Err(ConfigError::InvalidValue {
                field: "catalog.url",
                reason: err.to_string(),
            });
        }
        if self.catalog.cache_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.cache_key",
                reason: "must not be empty".to_string(),
            });
        }
        if self.catalog.cache_max_age_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.cache_max_age_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.http.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.max_size == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size",
                reason: "must be > 0 when set".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.http.request_timeout_ms)
    }

    /// Cache policy applied to catalog reads.
    pub fn catalog_cache_config(&self) -> CacheConfig {
        let config =
            CacheConfig::new().with_max_age(Duration::from_millis(self.catalog.cache_max_age_ms));
        match self.cache.max_size {
            Some(max_size) => config.with_max_size(max_size),
            None => config,
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("FUNNEL_CONFIG").ok().map(PathBuf::from)
}
