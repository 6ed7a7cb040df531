use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;
use crate::store::StoreError;

mod analytics;
mod booths;
mod campaigns;
mod constituencies;
mod parties;
mod predictions;
mod users;

pub fn router(state: AppState) -> Router {
    assert!(
        state.start_time.elapsed() < Duration::from_secs(86_400),
        "Application uptime exceeds 24 hours before router creation"
    );

    // CORS is open for the web and mobile clients; restrict origins at the
    // deployment edge.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let predictions_router = predictions::router().with_state(state.clone());
    let constituencies_router = constituencies::router().with_state(state.clone());
    let booths_router = booths::router().with_state(state.clone());
    let parties_router = parties::router().with_state(state.clone());
    let users_router = users::router().with_state(state.clone());
    let campaigns_router = campaigns::router().with_state(state.clone());
    let analytics_router = analytics::router().with_state(state.clone());
    Router::new()
        .route("/health", get(health_live))
        .route("/health/ready", get(health_ready))
        .nest("/predictions", predictions_router)
        .nest("/constituencies", constituencies_router)
        .nest("/booths", booths_router)
        .nest("/parties", parties_router)
        .nest("/users", users_router)
        .nest("/campaigns", campaigns_router)
        .nest("/analytics", analytics_router)
        .layer(cors)
        .with_state(state)
}

async fn health_live(State(state): State<AppState>) -> Result<Json<HealthResponse>, HttpError> {
    let uptime = state.start_time.elapsed().as_secs();
    assert!(
        uptime <= 31_536_000,
        "Uptime exceeds one year without restart"
    );
    let response = HealthResponse {
        status: "live",
        uptime_seconds: uptime,
    };
    Ok(Json(response))
}

async fn health_ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, HttpError> {
    state
        .database
        .ping()
        .await
        .map_err(|err| HttpError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string()))?;

    let response = ReadyResponse {
        status: "ready",
        cached_tokens: state.cache.caller_tokens.entry_count(),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    cached_tokens: u64,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        assert!(status != StatusCode::OK, "Error status cannot be 200");
        assert!(!message.is_empty(), "Error message cannot be empty");
        Self { status, message }
    }

    /// Locked and validation failures both surface as 400, but the locked
    /// message names the constituency so clients can tell the expected
    /// business state apart from bad input.
    pub fn from_store(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Validation { .. } | StoreError::Locked { .. } => StatusCode::BAD_REQUEST,
            StoreError::BoothNotFound(_) | StoreError::ConstituencyNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        info!("HTTP error: {}", self.message);
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}
