use crate::RECENT_WINDOW;
use crate::bandwidth::{BandwidthHistory, BandwidthSample};
use crate::counters::{CounterProvider, NetworkCounters};
use crate::credential_store::CredentialStore;
use crate::error::{Result, ServerError};
use crate::security::{SecurityEvent, SecurityFeed};
use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Everything a handler may touch, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub counters: Arc<dyn CounterProvider>,
    pub bandwidth: BandwidthHistory,
    pub security: SecurityFeed,
    pub credentials: Arc<CredentialStore>,
}

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, MessageResponse::new(self.client_message())).into_response()
    }
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/network", get(get_network))
        .route("/api/bandwidth", get(get_bandwidth))
        .route("/api/security", get(get_security))
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when `allowed_origins` is empty, otherwise exactly that list.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                ServerError::Configuration(format!("Invalid CORS origin {origin}: {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[instrument(skip(state))]
async fn get_network(State(state): State<AppState>) -> Result<Json<NetworkCounters>> {
    Ok(Json(state.counters.snapshot()?))
}

#[instrument(skip(state))]
async fn get_bandwidth(State(state): State<AppState>) -> Result<Json<Vec<BandwidthSample>>> {
    Ok(Json(state.bandwidth.record()?))
}

#[instrument(skip(state))]
async fn get_security(State(state): State<AppState>) -> Json<Vec<SecurityEvent>> {
    Json(state.security.generate_recent(RECENT_WINDOW))
}

fn credentials(
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(String, String)> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected credentials body: {}", rejection);
        ServerError::Validation("Request body must be JSON with username and password".to_string())
    })?;

    match (request.username, request.password) {
        (Some(username), Some(password)) => Ok((username, password)),
        _ => Err(ServerError::Validation(
            "Username and password are required".to_string(),
        )),
    }
}

#[instrument(skip(state, payload))]
async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let (username, password) = match credentials(payload) {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };
    info!("API: Signup request for {}", username);

    match state.credentials.create_user(&username, &password).await {
        Ok(_) => (
            StatusCode::CREATED,
            MessageResponse::new("User created successfully"),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let (username, password) = match credentials(payload) {
        Ok(pair) => pair,
        Err(e) => return e.into_response(),
    };
    info!("API: Login request for {}", username);

    match state.credentials.verify(&username, &password).await {
        Ok(()) => (StatusCode::OK, MessageResponse::new("Login successful")).into_response(),
        Err(e) => e.into_response(),
    }
}
