//! Configuration layer: typed settings with layered precedence (file → env).

use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const LOCAL_CONFIG_BASENAME: &str = "vetrina";
const ENV_PREFIX: &str = "VETRINA";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings from the optional local config file and the environment.
pub fn load() -> Result<Settings, LoadError> {
    let raw: RawSettings = Config::builder()
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let level = match raw.logging.level {
            Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
                LoadError::invalid("logging.level", format!("failed to parse: {err}"))
            })?,
            None => LevelFilter::INFO,
        };

        let format = if raw.logging.json.unwrap_or(false) {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };

        Ok(Self {
            logging: LoggingSettings { level, format },
            cache: CacheSettings {
                enabled: raw.cache.enabled.unwrap_or(true),
            },
        })
    }
}
