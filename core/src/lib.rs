//! User-profile domain layer.
//!
//! # Overview
//! Validated value types (`UserInfo`, `Verification`) compose into the `User`
//! aggregate. `UserApiRepository` loads and saves that aggregate through an
//! [`HttpClient`], whose results always arrive as a [`RequestOutput`]
//! envelope: a result, an API error, or a cancellation.
//!
//! # Design
//! - Vendor SDKs sit behind narrow traits: [`Transport`] for networking,
//!   [`HttpMetricRecorder`] for performance telemetry, [`RemoteConfigStore`]
//!   for remote config, [`AccessTokenSource`] for auth tokens.
//! - Every network-issuing operation takes a `CancellationToken`.
//! - Configuration is explicit ([`ProfileConfig`]); nothing reads globals.
//! - Wire DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod remote_config;
pub mod repository;
pub mod reqwest_transport;
pub mod rules;
pub mod tracker;
pub mod types;
pub mod user;
pub mod user_info;
pub mod verification;

pub use client::{AccessTokenSource, ApiHttpClient, HttpClient, RequestError, RequestInput, RequestOutput};
pub use config::{ConfigError, HttpClientConfig, LogConfig, ProfileConfig};
pub use error::{HttpClientError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use remote_config::{
    GetJsonError, GetOAuthConfigError, OAuthConfig, RemoteConfig, RemoteConfigStore,
    RemoteConfigStoreError,
};
pub use repository::{RepositoryError, UserApiRepository, UserRepository};
pub use reqwest_transport::ReqwestTransport;
pub use tracker::{
    HttpMetric, HttpMetricRecorder, HttpTracker, MetricsHttpTracker, NoopHttpTracker,
    TracingMetricRecorder,
};
pub use types::{ProfileDto, UpdateProfileDto, VerificationDto};
pub use user::{NewUser, User, UserError};
pub use user_info::{Country, NewUserInfo, UserInfo, UserInfoError};
pub use verification::{Verification, VerificationError, VerificationProvider, VerificationStatus};
pub use tokio_util::sync::CancellationToken;
