//! HTTP transport types.
//!
//! # Design
//! Requests and responses are plain data. `ApiHttpClient` builds an
//! `HttpRequest`, hands it to a [`Transport`], and interprets the
//! `HttpResponse` it gets back. Keeping the networking library behind this
//! seam means the client's envelope, tracking, and cancellation logic can be
//! tested with scripted transports, and the library can be swapped without
//! touching repositories.
//!
//! All fields use owned types (`String`, `Vec`) so requests can be moved into
//! spawned futures without lifetime concerns.

use async_trait::async_trait;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and carries no query string; query parameters travel
/// separately in `query` so they never end up in tracking data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Any status code is a response; interpreting it is the client's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes requests against the network.
///
/// Implementations must return non-2xx responses as `Ok`. Dropping the
/// returned future must abort the call; that is how cancellation reaches the
/// transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
