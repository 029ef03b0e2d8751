//! Performance tracking for outbound HTTP calls.
//!
//! # Design
//! `ApiHttpClient` opens a tracking session before each request and closes it
//! when a response arrives. Tracking is best-effort: a tracker that fails to
//! start simply leaves the request untracked.
//!
//! `MetricsHttpTracker` correlates sessions with metric handles produced by an
//! [`HttpMetricRecorder`], the seam where a telemetry SDK plugs in. Sessions
//! that never see a response (cancelled or failed calls) stay in the map until
//! the tracker is dropped.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Correlation id for one tracked request.
pub type SessionId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTrackerStart {
    pub url: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTrackerStop {
    pub session_id: SessionId,
    pub content_type: String,
    pub response_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("http metric could not be created: {0}")]
    Recorder(String),
}

/// Opens and closes tracking sessions around HTTP requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTracker: Send + Sync {
    /// Start tracking a request and return its session id.
    async fn start(&self, input: HttpTrackerStart) -> Result<SessionId, TrackerError>;

    /// Finish a session. Returns `false` when the session id is unknown.
    async fn stop(&self, input: HttpTrackerStop) -> bool;
}

/// A single in-progress HTTP measurement.
#[async_trait]
pub trait HttpMetric: Send {
    fn set_http_response_code(&mut self, code: u16);

    fn set_response_content_type(&mut self, content_type: &str);

    /// Finish the measurement and hand it to the backend.
    async fn stop(&mut self);
}

/// Creates metric handles; implemented by telemetry backends.
pub trait HttpMetricRecorder: Send + Sync {
    fn new_http_metric(&self, url: &str, method: &str) -> Result<Box<dyn HttpMetric>, TrackerError>;
}

/// Tracker backed by an [`HttpMetricRecorder`].
pub struct MetricsHttpTracker<R> {
    recorder: R,
    sessions: Mutex<HashMap<SessionId, Box<dyn HttpMetric>>>,
}

impl<R: HttpMetricRecorder> MetricsHttpTracker<R> {
    pub fn new(recorder: R) -> Self {
        Self {
            recorder,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of sessions started but not yet stopped.
    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl<R> std::fmt::Debug for MetricsHttpTracker<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsHttpTracker").finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: HttpMetricRecorder> HttpTracker for MetricsHttpTracker<R> {
    async fn start(&self, input: HttpTrackerStart) -> Result<SessionId, TrackerError> {
        let metric = self
            .recorder
            .new_http_metric(&input.url, &input.method.to_uppercase())?;
        let session_id = Uuid::new_v4().to_string();
        self.sessions.lock().await.insert(session_id.clone(), metric);
        Ok(session_id)
    }

    async fn stop(&self, input: HttpTrackerStop) -> bool {
        let Some(mut metric) = self.sessions.lock().await.remove(&input.session_id) else {
            return false;
        };
        metric.set_http_response_code(input.response_code);
        metric.set_response_content_type(&input.content_type);
        metric.stop().await;
        true
    }
}

/// Recorder that reports finished metrics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricRecorder;

impl HttpMetricRecorder for TracingMetricRecorder {
    fn new_http_metric(&self, url: &str, method: &str) -> Result<Box<dyn HttpMetric>, TrackerError> {
        Ok(Box::new(TracingHttpMetric {
            url: url.to_owned(),
            method: method.to_owned(),
            started: Instant::now(),
            response_code: None,
            content_type: None,
        }))
    }
}

struct TracingHttpMetric {
    url: String,
    method: String,
    started: Instant,
    response_code: Option<u16>,
    content_type: Option<String>,
}

#[async_trait]
impl HttpMetric for TracingHttpMetric {
    fn set_http_response_code(&mut self, code: u16) {
        self.response_code = Some(code);
    }

    fn set_response_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_owned());
    }

    async fn stop(&mut self) {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::event!(
            target: "profile_core::http_metric",
            tracing::Level::INFO,
            http.method = %self.method,
            http.url = %self.url,
            http.status_code = self.response_code.unwrap_or(0),
            http.content_type = self.content_type.as_deref().unwrap_or("unknown"),
            elapsed_ms,
            "http request finished"
        );
    }
}

/// Tracker for hosts without telemetry. Every stop succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpTracker;

#[async_trait]
impl HttpTracker for NoopHttpTracker {
    async fn start(&self, _input: HttpTrackerStart) -> Result<SessionId, TrackerError> {
        Ok(Uuid::new_v4().to_string())
    }

    async fn stop(&self, _input: HttpTrackerStop) -> bool {
        true
    }
}
