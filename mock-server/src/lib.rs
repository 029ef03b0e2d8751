use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Bearer token accepted by the default app.
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Error code the API returns for missing or invalid credentials.
pub const UNAUTHENTICATED_CODE: &str = "1000001";

/// How long `GET /slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub status: String,
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub message_id: String,
}

#[derive(Clone)]
pub struct AppState {
    profile: Arc<RwLock<Profile>>,
    token: Arc<str>,
}

/// The profile served by [`app`].
pub fn default_profile() -> Profile {
    Profile {
        id: 1,
        first_name: "Jon".to_string(),
        last_name: "Doe".to_string(),
        email: "jd@email.com".to_string(),
        phone_number: Some("09000000000".to_string()),
        country_code: "NG".to_string(),
        verification: None,
    }
}

pub fn app() -> Router {
    app_with(default_profile(), ACCESS_TOKEN)
}

/// Router serving `profile` to requests bearing `token`.
pub fn app_with(profile: Profile, token: &str) -> Router {
    let state = AppState {
        profile: Arc::new(RwLock::new(profile)),
        token: Arc::from(token),
    };
    Router::new()
        .route("/me", get(get_me))
        .route("/update-me", put(update_me))
        .route("/slow", get(slow))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if presented == Some(&*state.token) {
        return Ok(());
    }
    tracing::info!("rejected unauthenticated request");
    Err((
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            message: "Unauthenticated".to_string(),
            message_id: UNAUTHENTICATED_CODE.to_string(),
        }),
    )
        .into_response())
}

async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Profile>, Response> {
    authorize(&state, &headers)?;
    Ok(Json(state.profile.read().await.clone()))
}

async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<Profile>, Response> {
    authorize(&state, &headers)?;
    let mut profile = state.profile.write().await;
    profile.first_name = input.first_name;
    profile.last_name = input.last_name;
    profile.phone_number = Some(input.phone_number);
    tracing::info!(id = profile.id, "profile updated");
    Ok(Json(profile.clone()))
}

async fn slow() -> Json<serde_json::Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(serde_json::json!({}))
}
