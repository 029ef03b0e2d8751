//! Typed access to remotely managed configuration.
//!
//! # Design
//! The vendor SDK sits behind [`RemoteConfigStore`]. `RemoteConfig` activates
//! the latest values in the background when created and again whenever a key
//! comes back empty, so callers never wait on the network; an empty value is
//! reported as `None` until a later refresh fills it in.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Key holding the JSON-encoded OAuth client configuration.
pub const OAUTH_CONFIG_KEY: &str = "OAUTH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteConfigStoreError {
    /// The stored value exists but cannot be read as a string.
    #[error("value for '{0}' is not a string")]
    NotAString(String),

    #[error("remote config backend failed: {0}")]
    Backend(String),
}

/// Vendor remote-config capability.
#[async_trait]
pub trait RemoteConfigStore: Send + Sync + 'static {
    /// Fetch the latest values and make them active.
    async fn fetch_and_activate(&self) -> Result<(), RemoteConfigStoreError>;

    /// Read the active value for `key`.
    fn get_string(&self, key: &str) -> Result<Option<String>, RemoteConfigStoreError>;
}

#[derive(Debug, Error)]
pub enum GetJsonError {
    #[error("value is not a valid json")]
    InvalidJson(#[source] serde_json::Error),

    #[error("cannot get result as string")]
    NotAString,

    #[error(transparent)]
    Store(RemoteConfigStoreError),
}

impl From<RemoteConfigStoreError> for GetJsonError {
    fn from(error: RemoteConfigStoreError) -> Self {
        match error {
            RemoteConfigStoreError::NotAString(_) => GetJsonError::NotAString,
            other => GetJsonError::Store(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GetOAuthConfigError {
    #[error("unable to get oauth config")]
    Unavailable,

    #[error("an unexpected error has occurred")]
    Unexpected,
}

impl From<GetJsonError> for GetOAuthConfigError {
    fn from(error: GetJsonError) -> Self {
        match error {
            GetJsonError::InvalidJson(_) | GetJsonError::NotAString => {
                GetOAuthConfigError::Unavailable
            }
            GetJsonError::Store(_) => GetOAuthConfigError::Unexpected,
        }
    }
}

/// OAuth client settings, kept as the raw JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OAuthConfig(Map<String, Value>);

impl OAuthConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct RemoteConfig<S> {
    store: Arc<S>,
}

impl<S> std::fmt::Debug for RemoteConfig<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig").finish_non_exhaustive()
    }
}

impl<S: RemoteConfigStore> RemoteConfig<S> {
    /// Wrap `store` and start activating the latest values.
    pub fn new(store: S) -> Self {
        let config = Self {
            store: Arc::new(store),
        };
        config.refresh();
        config
    }

    /// Read `key` as JSON. An empty or missing value triggers a refresh and
    /// yields `Ok(None)`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, GetJsonError> {
        let raw = match self.store.get_string(key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                self.refresh();
                return Ok(None);
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(GetJsonError::InvalidJson)
    }

    /// Read the OAuth configuration. A JSON `null` is reported as `None`.
    pub fn get_oauth_config(&self) -> Result<Option<OAuthConfig>, GetOAuthConfigError> {
        match self.get_json::<Option<OAuthConfig>>(OAUTH_CONFIG_KEY) {
            Ok(config) => Ok(config.flatten()),
            Err(error) => {
                tracing::debug!(error = %error, key = OAUTH_CONFIG_KEY, "oauth config unreadable");
                Err(error.into())
            }
        }
    }

    /// Spawn a fetch-and-activate on the current runtime, if there is one.
    fn refresh(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, remote config refresh skipped");
            return;
        };
        let store = Arc::clone(&self.store);
        handle.spawn(async move {
            if let Err(error) = store.fetch_and_activate().await {
                tracing::debug!(error = %error, "remote config refresh failed");
            }
        });
    }
}
