//! The HTTP client contract and its transport-backed implementation.
//!
//! # Design
//! Every call resolves to a [`RequestOutput`] envelope holding exactly one of
//! a result, an API error, or a cancellation. Repositories match on the
//! envelope instead of inspecting transport errors. The outer `Result` is
//! reserved for failures the client cannot classify.
//!
//! `ApiHttpClient` owns the cross-cutting concerns: base URL joining, bearer
//! token injection, tracking sessions, error-body decoding, and bridging the
//! caller's [`CancellationToken`] to the transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpClientError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::tracker::{HttpTracker, HttpTrackerStart, HttpTrackerStop, SessionId};

/// Error code reported when the response body carries no `message_id`.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN";

/// Content type reported to the tracker when the response has none.
const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Upper bound on a single tracker call.
pub const TRACKING_TIMEOUT: Duration = Duration::from_millis(500);

/// Options shared by every request.
#[derive(Debug, Clone)]
pub struct RequestInput {
    /// Path relative to the base URL, e.g. `/me`.
    pub endpoint: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Skip bearer token injection for this request.
    pub exclude_access_token: bool,
    pub cancel: CancellationToken,
}

impl RequestInput {
    pub fn new(endpoint: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: Vec::new(),
            headers: Vec::new(),
            exclude_access_token: false,
            cancel,
        }
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn without_access_token(mut self) -> Self {
        self.exclude_access_token = true;
        self
    }
}

/// An API-level failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    pub message: String,
    /// Value of the body's `message_id`, or [`UNKNOWN_ERROR_CODE`].
    pub error_code: String,
    /// HTTP status, or `0` when no response was received.
    pub status_code: u16,
    /// Remaining fields of the error body.
    pub data: Map<String, Value>,
}

impl RequestError {
    fn from_response(response: &HttpResponse) -> Self {
        let mut data = match parse_body(&response.body) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let message = take_text(&mut data, "message")
            .unwrap_or_else(|| format!("Request failed with status code {}", response.status));
        let error_code =
            take_text(&mut data, "message_id").unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_owned());
        Self {
            message,
            error_code,
            status_code: response.status,
            data,
        }
    }

    fn from_transport(error: &TransportError) -> Self {
        Self {
            message: error.message.clone(),
            error_code: UNKNOWN_ERROR_CODE.to_owned(),
            status_code: 0,
            data: Map::new(),
        }
    }
}

/// Outcome of a request: exactly one of result, error, or cancellation.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutput<T = Value> {
    Result(T),
    Error(RequestError),
    Cancelled,
}

impl<T> RequestOutput<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestOutput::Cancelled)
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            RequestOutput::Result(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            RequestOutput::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl RequestOutput<Value> {
    /// Deserialize the result payload, leaving errors and cancellations as is.
    pub fn decode<T: DeserializeOwned>(self) -> Result<RequestOutput<T>, serde_json::Error> {
        Ok(match self {
            RequestOutput::Result(value) => RequestOutput::Result(serde_json::from_value(value)?),
            RequestOutput::Error(error) => RequestOutput::Error(error),
            RequestOutput::Cancelled => RequestOutput::Cancelled,
        })
    }
}

/// HTTP operations available to repositories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, input: RequestInput) -> Result<RequestOutput, HttpClientError>;

    async fn post(&self, input: RequestInput, data: Value)
        -> Result<RequestOutput, HttpClientError>;

    async fn put(&self, input: RequestInput, data: Value)
        -> Result<RequestOutput, HttpClientError>;

    async fn delete(&self, input: RequestInput) -> Result<RequestOutput, HttpClientError>;
}

/// Supplies the bearer token attached to authenticated requests.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// [`HttpClient`] that sends requests through a [`Transport`].
pub struct ApiHttpClient<T> {
    base_url: String,
    transport: T,
    tracker: Arc<dyn HttpTracker>,
    access_token: Option<Arc<dyn AccessTokenSource>>,
}

impl<T> std::fmt::Debug for ApiHttpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHttpClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ApiHttpClient<T> {
    pub fn new(
        config: &HttpClientConfig,
        transport: T,
        tracker: Arc<dyn HttpTracker>,
    ) -> Result<Self, HttpClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(HttpClientError::BaseUrlRequired);
        }
        parse_url(base_url)?;
        Ok(Self {
            base_url: base_url.to_owned(),
            transport,
            tracker,
            access_token: None,
        })
    }

    #[must_use]
    pub fn with_access_token(mut self, source: Arc<dyn AccessTokenSource>) -> Self {
        self.access_token = Some(source);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<String, HttpClientError> {
        let joined = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Ok(parse_url(&joined)?.to_string())
    }

    fn request_headers(
        &self,
        custom: Vec<(String, String)>,
        exclude_access_token: bool,
        has_body: bool,
    ) -> Vec<(String, String)> {
        let mut headers = custom;
        if has_body && !has_header(&headers, "content-type") {
            headers.push(("content-type".to_owned(), "application/json".to_owned()));
        }
        if !exclude_access_token && !has_header(&headers, "authorization") {
            if let Some(token) = self.access_token.as_ref().and_then(|source| source.access_token()) {
                headers.push(("authorization".to_owned(), format!("Bearer {token}")));
            }
        }
        headers
    }

    async fn send(
        &self,
        method: HttpMethod,
        input: RequestInput,
        data: Option<Value>,
    ) -> Result<RequestOutput, HttpClientError> {
        let RequestInput {
            endpoint,
            params,
            headers,
            exclude_access_token,
            cancel,
        } = input;

        if cancel.is_cancelled() {
            return Ok(RequestOutput::Cancelled);
        }

        let body = data.map(|value| serde_json::to_string(&value)).transpose()?;
        let request = HttpRequest {
            method,
            url: self.endpoint_url(&endpoint)?,
            query: params,
            headers: self.request_headers(headers, exclude_access_token, body.is_some()),
            body,
        };

        let exchange = async move {
            let session = self.start_tracking(&request).await;
            let outcome = self.transport.execute(request).await;
            if let Ok(response) = &outcome {
                self.stop_tracking(session, response).await;
            }
            outcome
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(RequestOutput::Cancelled),
            outcome = exchange => outcome,
        };

        match outcome {
            Ok(response) => Ok(classify_response(&response)),
            Err(error) if error.is_abort() => Ok(RequestOutput::Cancelled),
            Err(error) => {
                tracing::debug!(error = %error, kind = ?error.kind, "http transport failed");
                Ok(RequestOutput::Error(RequestError::from_transport(&error)))
            }
        }
    }

    async fn start_tracking(&self, request: &HttpRequest) -> Option<SessionId> {
        let input = HttpTrackerStart {
            url: request.url.clone(),
            method: request.method.as_str().to_owned(),
        };
        match tokio::time::timeout(TRACKING_TIMEOUT, self.tracker.start(input)).await {
            Ok(Ok(session_id)) => Some(session_id),
            Ok(Err(error)) => {
                tracing::debug!(error = %error, url = %request.url, "http tracking not started");
                None
            }
            Err(_) => {
                tracing::debug!(url = %request.url, "http tracking start timed out");
                None
            }
        }
    }

    async fn stop_tracking(&self, session: Option<SessionId>, response: &HttpResponse) {
        let Some(session_id) = session else {
            return;
        };
        let input = HttpTrackerStop {
            session_id,
            content_type: response
                .header("content-type")
                .unwrap_or(UNKNOWN_CONTENT_TYPE)
                .to_owned(),
            response_code: response.status,
        };
        match tokio::time::timeout(TRACKING_TIMEOUT, self.tracker.stop(input)).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(status = response.status, "http tracking session was not open");
            }
            Err(_) => tracing::debug!(status = response.status, "http tracking stop timed out"),
        }
    }
}

#[async_trait]
impl<T: Transport> HttpClient for ApiHttpClient<T> {
    async fn get(&self, input: RequestInput) -> Result<RequestOutput, HttpClientError> {
        self.send(HttpMethod::Get, input, None).await
    }

    async fn post(
        &self,
        input: RequestInput,
        data: Value,
    ) -> Result<RequestOutput, HttpClientError> {
        self.send(HttpMethod::Post, input, Some(data)).await
    }

    async fn put(
        &self,
        input: RequestInput,
        data: Value,
    ) -> Result<RequestOutput, HttpClientError> {
        self.send(HttpMethod::Put, input, Some(data)).await
    }

    async fn delete(&self, input: RequestInput) -> Result<RequestOutput, HttpClientError> {
        self.send(HttpMethod::Delete, input, None).await
    }
}

fn parse_url(raw: &str) -> Result<Url, HttpClientError> {
    Url::parse(raw).map_err(|e| HttpClientError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

fn classify_response(response: &HttpResponse) -> RequestOutput {
    if response.is_success() {
        RequestOutput::Result(parse_body(&response.body))
    } else {
        RequestOutput::Error(RequestError::from_response(response))
    }
}

/// Empty bodies become `null`; bodies that are not JSON are kept as text.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned()))
}

/// Remove `key` from an error body, keeping it only if it holds usable text.
fn take_text(data: &mut Map<String, Value>, key: &str) -> Option<String> {
    match data.remove(key)? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;
    use crate::tracker::{MockHttpTracker, NoopHttpTracker, TrackerError};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const BASE_URL: &str = "http://example.com";

    enum Script {
        Respond(HttpResponse),
        Fail(TransportError),
        Hang,
    }

    struct ScriptedTransport {
        script: Script,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: Script) -> Self {
            Self {
                script,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn respond(status: u16, body: Value) -> Self {
            Self::new(Script::Respond(HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: body.to_string(),
            }))
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            match &self.script {
                Script::Respond(response) => Ok(response.clone()),
                Script::Fail(error) => Err(error.clone()),
                Script::Hang => std::future::pending().await,
            }
        }
    }

    struct StaticToken(&'static str);

    impl AccessTokenSource for StaticToken {
        fn access_token(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn config() -> HttpClientConfig {
        HttpClientConfig {
            base_url: BASE_URL.to_string(),
        }
    }

    fn client(transport: ScriptedTransport) -> ApiHttpClient<ScriptedTransport> {
        ApiHttpClient::new(&config(), transport, Arc::new(NoopHttpTracker)).unwrap()
    }

    fn input(endpoint: &str) -> RequestInput {
        RequestInput::new(endpoint, CancellationToken::new())
    }

    async fn call(
        client: &ApiHttpClient<ScriptedTransport>,
        method: HttpMethod,
        input: RequestInput,
    ) -> Result<RequestOutput, HttpClientError> {
        match method {
            HttpMethod::Get => client.get(input).await,
            HttpMethod::Post => client.post(input, json!({})).await,
            HttpMethod::Put => client.put(input, json!({})).await,
            HttpMethod::Delete => client.delete(input).await,
        }
    }

    #[rstest]
    #[case(HttpMethod::Get)]
    #[case(HttpMethod::Post)]
    #[case(HttpMethod::Put)]
    #[case(HttpMethod::Delete)]
    #[tokio::test]
    async fn returns_success_result(#[case] method: HttpMethod) {
        let client = client(ScriptedTransport::respond(200, json!({"name": "John"})));
        let output = call(&client, method, input("/get-one")).await.unwrap();

        assert_eq!(output, RequestOutput::Result(json!({"name": "John"})));
        let requests = client.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, method);
        assert_eq!(requests[0].url, "http://example.com/get-one");
    }

    #[rstest]
    #[case(HttpMethod::Get)]
    #[case(HttpMethod::Post)]
    #[case(HttpMethod::Put)]
    #[case(HttpMethod::Delete)]
    #[tokio::test]
    async fn returns_failure_result(#[case] method: HttpMethod) {
        let client = client(ScriptedTransport::respond(
            401,
            json!({"message": "unauthorized access", "message_id": "100001", "otpID": "300940"}),
        ));
        let output = call(&client, method, input("/get-two")).await.unwrap();

        let error = output.error().unwrap();
        assert_eq!(error.message, "unauthorized access");
        assert_eq!(error.error_code, "100001");
        assert_eq!(error.status_code, 401);
        assert_eq!(error.data.get("otpID"), Some(&json!("300940")));
        assert_eq!(error.data.len(), 1);
        assert!(output.result().is_none());
        assert!(!output.is_cancelled());
    }

    #[rstest]
    #[case(HttpMethod::Get)]
    #[case(HttpMethod::Post)]
    #[case(HttpMethod::Put)]
    #[case(HttpMethod::Delete)]
    #[tokio::test]
    async fn transport_abort_is_cancellation(#[case] method: HttpMethod) {
        let client = client(ScriptedTransport::new(Script::Fail(TransportError::aborted())));
        let output = call(&client, method, input("/get-three")).await.unwrap();
        assert_eq!(output, RequestOutput::Cancelled);
    }

    #[tokio::test]
    async fn aborted_message_is_cancellation() {
        let client = client(ScriptedTransport::new(Script::Fail(TransportError::new(
            TransportErrorKind::Other,
            "socket closed: request aborted",
        ))));
        let output = client.get(input("/race")).await.unwrap();
        assert!(output.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_the_token_aborts_a_pending_call() {
        let client = client(ScriptedTransport::new(Script::Hang));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let output = client.get(RequestInput::new("/slow", cancel)).await.unwrap();
        assert_eq!(output, RequestOutput::Cancelled);
        assert_eq!(client.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_token_skips_the_transport() {
        let client = client(ScriptedTransport::respond(200, json!({})));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let output = client.get(RequestInput::new("/get-one", cancel)).await.unwrap();
        assert_eq!(output, RequestOutput::Cancelled);
        assert!(client.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn network_failure_is_an_unknown_error() {
        let client = client(ScriptedTransport::new(Script::Fail(TransportError::new(
            TransportErrorKind::Connect,
            "connection refused",
        ))));
        let output = client.get(input("/down")).await.unwrap();
        assert_eq!(
            output,
            RequestOutput::Error(RequestError {
                message: "connection refused".to_string(),
                error_code: UNKNOWN_ERROR_CODE.to_string(),
                status_code: 0,
                data: Map::new(),
            })
        );
    }

    #[tokio::test]
    async fn error_without_body_fields_uses_defaults() {
        let client = client(ScriptedTransport::new(Script::Respond(HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "internal error".to_string(),
        })));
        let output = client.get(input("/boom")).await.unwrap();
        let error = output.error().unwrap();
        assert_eq!(error.message, "Request failed with status code 500");
        assert_eq!(error.error_code, UNKNOWN_ERROR_CODE);
        assert_eq!(error.status_code, 500);
        assert!(error.data.is_empty());
    }

    #[tokio::test]
    async fn numeric_message_id_is_kept_as_text() {
        let client = client(ScriptedTransport::respond(
            403,
            json!({"message": "forbidden", "message_id": 1000001}),
        ));
        let output = client.get(input("/numeric")).await.unwrap();
        assert_eq!(output.error().unwrap().error_code, "1000001");
    }

    #[rstest]
    #[case("", Value::Null)]
    #[case("plain text", json!("plain text"))]
    #[case("[1,2]", json!([1, 2]))]
    #[tokio::test]
    async fn success_body_parsing(#[case] body: &str, #[case] expected: Value) {
        let client = client(ScriptedTransport::new(Script::Respond(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        })));
        let output = client.get(input("/body")).await.unwrap();
        assert_eq!(output, RequestOutput::Result(expected));
    }

    #[tokio::test]
    async fn sends_params_headers_and_json_body() {
        let client = client(ScriptedTransport::respond(200, json!({})));
        let input = input("items")
            .param("page", "2")
            .header("x-request-id", "abc");
        client.post(input, json!({"name": "John"})).await.unwrap();

        let request = &client.transport.requests()[0];
        assert_eq!(request.url, "http://example.com/items");
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert!(request
            .headers
            .contains(&("x-request-id".to_string(), "abc".to_string())));
        assert!(request
            .headers
            .contains(&("content-type".to_string(), "application/json".to_string())));
        assert_eq!(request.body.as_deref(), Some(r#"{"name":"John"}"#));
    }

    #[tokio::test]
    async fn injects_access_token_unless_excluded() {
        let client = client(ScriptedTransport::respond(200, json!({})))
            .with_access_token(Arc::new(StaticToken("secret")));
        let bearer = ("authorization".to_string(), "Bearer secret".to_string());

        client.get(input("/me")).await.unwrap();
        client.get(input("/public").without_access_token()).await.unwrap();

        let requests = client.transport.requests();
        assert!(requests[0].headers.contains(&bearer));
        assert!(!requests[1].headers.contains(&bearer));
    }

    #[tokio::test]
    async fn caller_authorization_header_wins() {
        let client = client(ScriptedTransport::respond(200, json!({})))
            .with_access_token(Arc::new(StaticToken("secret")));
        client
            .get(input("/me").header("Authorization", "Basic abc"))
            .await
            .unwrap();

        let headers = &client.transport.requests()[0].headers;
        assert_eq!(headers, &vec![("Authorization".to_string(), "Basic abc".to_string())]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("/")]
    fn empty_base_url_is_rejected(#[case] base_url: &str) {
        let config = HttpClientConfig {
            base_url: base_url.to_string(),
        };
        let err = ApiHttpClient::new(
            &config,
            ScriptedTransport::new(Script::Hang),
            Arc::new(NoopHttpTracker),
        )
        .unwrap_err();
        assert!(matches!(err, HttpClientError::BaseUrlRequired));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = HttpClientConfig {
            base_url: "not a url".to_string(),
        };
        let err = ApiHttpClient::new(
            &config,
            ScriptedTransport::new(Script::Hang),
            Arc::new(NoopHttpTracker),
        )
        .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn base_path_and_trailing_slash_are_preserved() {
        let config = HttpClientConfig {
            base_url: "http://example.com/api/v1/".to_string(),
        };
        let client = ApiHttpClient::new(
            &config,
            ScriptedTransport::respond(200, json!({})),
            Arc::new(NoopHttpTracker),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://example.com/api/v1");

        client.get(input("/me")).await.unwrap();
        assert_eq!(client.transport.requests()[0].url, "http://example.com/api/v1/me");
    }

    #[tokio::test]
    async fn tracks_success_and_error_responses() {
        for (status, body) in [(200, json!({})), (401, json!({"message": "no"}))] {
            let mut tracker = MockHttpTracker::new();
            tracker
                .expect_start()
                .withf(|input| input.url == "http://example.com/tracked" && input.method == "GET")
                .times(1)
                .returning(|_| Ok("session-1".to_string()));
            tracker
                .expect_stop()
                .withf(move |input| {
                    input.session_id == "session-1"
                        && input.content_type == "application/json"
                        && input.response_code == status
                })
                .times(1)
                .returning(|_| true);

            let client = ApiHttpClient::new(
                &config(),
                ScriptedTransport::respond(status, body),
                Arc::new(tracker),
            )
            .unwrap();
            client.get(input("/tracked")).await.unwrap();
        }
    }

    #[tokio::test]
    async fn tracking_failure_does_not_block_the_request() {
        let mut tracker = MockHttpTracker::new();
        tracker
            .expect_start()
            .times(1)
            .returning(|_| Err(TrackerError::Recorder("offline".to_string())));
        tracker.expect_stop().never();

        let client = ApiHttpClient::new(
            &config(),
            ScriptedTransport::respond(200, json!({"ok": true})),
            Arc::new(tracker),
        )
        .unwrap();
        let output = client.get(input("/untracked")).await.unwrap();
        assert_eq!(output, RequestOutput::Result(json!({"ok": true})));
    }

    #[tokio::test]
    async fn missing_content_type_is_reported_as_unknown() {
        let mut tracker = MockHttpTracker::new();
        tracker
            .expect_start()
            .returning(|_| Ok("session-2".to_string()));
        tracker
            .expect_stop()
            .withf(|input| input.content_type == "unknown" && input.response_code == 204)
            .times(1)
            .returning(|_| false);

        let client = ApiHttpClient::new(
            &config(),
            ScriptedTransport::new(Script::Respond(HttpResponse {
                status: 204,
                headers: Vec::new(),
                body: String::new(),
            })),
            Arc::new(tracker),
        )
        .unwrap();
        let output = client.delete(input("/items/1")).await.unwrap();
        assert_eq!(output, RequestOutput::Result(Value::Null));
    }

    struct HangingTracker {
        hang_start: bool,
    }

    #[async_trait]
    impl HttpTracker for HangingTracker {
        async fn start(&self, _input: HttpTrackerStart) -> Result<SessionId, TrackerError> {
            if self.hang_start {
                std::future::pending::<()>().await;
            }
            Ok("session-hang".to_string())
        }

        async fn stop(&self, _input: HttpTrackerStop) -> bool {
            std::future::pending().await
        }
    }

    fn hanging_client(hang_start: bool) -> ApiHttpClient<ScriptedTransport> {
        ApiHttpClient::new(
            &config(),
            ScriptedTransport::respond(200, json!({"ok": true})),
            Arc::new(HangingTracker { hang_start }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn cancellation_wins_over_a_stalled_tracker() {
        let client = hanging_client(true);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let output = tokio::time::timeout(
            TRACKING_TIMEOUT / 2,
            client.get(RequestInput::new("/me", cancel)),
        )
        .await
        .expect("cancellation must not wait on the tracker")
        .unwrap();
        assert_eq!(output, RequestOutput::Cancelled);
        assert!(client.transport.requests().is_empty());
    }

    #[rstest]
    #[case::stalled_start(true)]
    #[case::stalled_stop(false)]
    #[tokio::test]
    async fn stalled_tracker_does_not_block_the_request(#[case] hang_start: bool) {
        let client = hanging_client(hang_start);

        let output = tokio::time::timeout(TRACKING_TIMEOUT * 4, client.get(input("/me")))
            .await
            .expect("request must finish once the tracker times out")
            .unwrap();
        assert_eq!(output, RequestOutput::Result(json!({"ok": true})));
        assert_eq!(client.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_leaves_the_session_open() {
        let mut tracker = MockHttpTracker::new();
        tracker
            .expect_start()
            .times(1)
            .returning(|_| Ok("session-3".to_string()));
        tracker.expect_stop().never();

        let client = ApiHttpClient::new(
            &config(),
            ScriptedTransport::new(Script::Fail(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused",
            ))),
            Arc::new(tracker),
        )
        .unwrap();
        let output = client.get(input("/down")).await.unwrap();
        assert_eq!(output.error().unwrap().status_code, 0);
    }

    #[test]
    fn decode_maps_only_results() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Named {
            name: String,
        }

        let decoded = RequestOutput::Result(json!({"name": "John"}))
            .decode::<Named>()
            .unwrap();
        assert_eq!(
            decoded,
            RequestOutput::Result(Named {
                name: "John".to_string()
            })
        );
        assert_eq!(
            RequestOutput::Cancelled.decode::<Named>().unwrap(),
            RequestOutput::Cancelled
        );
        assert!(RequestOutput::Result(json!(3)).decode::<Named>().is_err());
    }
}
