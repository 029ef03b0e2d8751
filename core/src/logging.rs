//! `tracing` subscriber setup.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install a global fmt subscriber. Returns `false` if one was already set.
///
/// An invalid filter directive falls back to the default level and is
/// reported through the installed subscriber.
pub fn init(config: &LogConfig) -> bool {
    let (filter, rejected) = match build_filter(config) {
        Ok(filter) => (filter, None),
        Err(e) => (default_filter(config), Some(e)),
    };
    let installed = match fmt().with_env_filter(filter).try_init() {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "tracing already initialised");
            false
        }
    };
    if let Some(e) = rejected {
        tracing::warn!(error = %e, directive = ?config.filter, "ignoring invalid log filter");
    }
    installed
}

/// The explicit directive if set, else `debug` in dev mode and `warn`
/// otherwise.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter, ParseError> {
    match config.filter.as_deref() {
        Some(directive) => EnvFilter::try_new(directive),
        None => Ok(default_filter(config)),
    }
}

fn default_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::new(if config.dev_mode { "debug" } else { "warn" })
}
