//! Explicit configuration for the profile layer.
//!
//! Hosts either deserialize a [`ProfileConfig`] from their own config source
//! or read it from the process environment with [`ProfileConfig::from_env`].

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const BASE_URL_VAR: &str = "PROFILE_API_BASE_URL";
pub const DEV_MODE_VAR: &str = "PROFILE_DEV_MODE";
pub const LOG_FILTER_VAR: &str = "PROFILE_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    MissingVar(&'static str),

    #[error("invalid base url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileConfig {
    pub api: HttpClientConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Settings for `ApiHttpClient`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpClientConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Verbose logging for development builds.
    #[serde(default)]
    pub dev_mode: bool,
    /// `EnvFilter` directive overriding the default level.
    #[serde(default)]
    pub filter: Option<String>,
}

impl ProfileConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingVar(BASE_URL_VAR))?;
        Url::parse(&base_url).map_err(|source| ConfigError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        let dev_mode = lookup(DEV_MODE_VAR).is_some_and(|value| is_truthy(&value));
        let filter = lookup(LOG_FILTER_VAR).filter(|value| !value.trim().is_empty());

        Ok(Self {
            api: HttpClientConfig { base_url },
            log: LogConfig { dev_mode, filter },
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
