//! HTTP API for interaction verification
//!
//! Endpoints:
//! - POST /api/interactions/verify - Verify one subject
//! - POST /api/interactions/generate-fixtures - Record replay fixtures
//! - GET /api/interactions/status - Run mode and capabilities
//! - GET /health - Health check

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::core::engine::VerificationEngine;
use crate::types::{
    FixtureReport, InteractionOutcome, RunMode, ScoringMode, VerificationRequest, VerifyError,
};

/// App state
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    /// Fixed per server
    pub mode: RunMode,
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

/// Failure envelope, rendered from a `VerifyError`
#[derive(Debug)]
pub struct ApiError(VerifyError);

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(VerifyError::Input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            VerifyError::Input(_) => StatusCode::BAD_REQUEST,
            VerifyError::NotFound(_) => StatusCode::NOT_FOUND,
            VerifyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            VerifyError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));

        (status, body).into_response()
    }
}

/// Which actions the current scoring mode checks
#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub follows: bool,
    pub commented: bool,
    pub retweeted: bool,
    pub liked: bool,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub mode: RunMode,
    pub scoring: ScoringMode,
    /// Actions the score is computed over
    pub actions: usize,
    pub capabilities: Capabilities,
    pub fixtures_required: bool,
    pub data_source_configured: bool,
    pub message: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the API router
pub fn create_router(engine: Arc<VerificationEngine>, mode: RunMode) -> Router {
    let state = Arc::new(AppState { engine, mode });

    Router::new()
        .route("/health", get(health))
        .route("/api/interactions/verify", post(verify))
        .route("/api/interactions/generate-fixtures", post(generate_fixtures))
        .route("/api/interactions/status", get(status))
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Verify one subject against one post
async fn verify(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<InteractionOutcome>>, ApiError> {
    let Json(request) = payload?;

    match state.engine.verify(&request, state.mode).await {
        Ok(outcome) => Ok(ApiResponse::ok(outcome)),
        Err(e) => {
            tracing::warn!(
                subject = %request.subject,
                code = e.code(),
                error = %e,
                "verification failed"
            );
            Err(e.into())
        }
    }
}

/// Record the configured sample as replay fixtures
async fn generate_fixtures(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<FixtureReport>>, ApiError> {
    match state.engine.generate_fixtures(state.mode).await {
        Ok(report) => Ok(ApiResponse::ok(report)),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "fixture generation failed");
            Err(e.into())
        }
    }
}

/// Report mode and capabilities
async fn status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatusResponse>> {
    let scoring = state.engine.scoring();
    let message = match state.mode {
        RunMode::Replay => "Replay mode: answers come from recorded fixtures".to_string(),
        RunMode::Live => "Live mode: answers come from the data source and cache".to_string(),
    };

    ApiResponse::ok(StatusResponse {
        mode: state.mode,
        scoring,
        actions: scoring.action_count(),
        capabilities: Capabilities {
            follows: true,
            commented: true,
            retweeted: scoring.includes_retweet(),
            liked: false,
        },
        fixtures_required: state.mode == RunMode::Replay,
        data_source_configured: state.engine.has_source(),
        message,
    })
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    engine: Arc<VerificationEngine>,
    mode: RunMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let scoring = engine.scoring();
    let router = create_router(engine, mode);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %mode, %scoring, "interaction verifier API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
