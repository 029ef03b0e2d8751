//! Error types for the HTTP layer.
//!
//! # Design
//! Failures that happen *on the wire* are not errors of the client: a
//! non-2xx response becomes `RequestOutput::Error` and an aborted call becomes
//! `RequestOutput::Cancelled`. `HttpClientError` only covers what the client
//! cannot classify, such as a malformed URL. `TransportError` is what a
//! [`Transport`](crate::http::Transport) reports when no response arrived.

use thiserror::Error;

/// Errors returned by `ApiHttpClient` that fall outside the request envelope.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The client was configured with an empty base URL.
    #[error("Base url is required to initialize.")]
    BaseUrlRequired,

    /// The base URL or an endpoint produced an unparsable URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The in-flight call was aborted.
    Aborted,
    Timeout,
    Connect,
    Other,
}

/// A request that produced no HTTP response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self::new(TransportErrorKind::Aborted, "Request aborted")
    }

    /// Whether this failure should be reported as a cancellation.
    ///
    /// Besides an explicit abort, any message mentioning "aborted" counts:
    /// some transports surface their own abort as a generic I/O error.
    pub fn is_abort(&self) -> bool {
        self.kind == TransportErrorKind::Aborted
            || self.message.to_lowercase().contains("aborted")
    }
}
