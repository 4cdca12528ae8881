//! HTTP surface of the gateway.
//!
//! Thin plumbing: wire types, the shared router state, and one handler per
//! endpoint. All data shaping lives in the pipeline module.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use citegate_core::{AppError, GatewayConfig, Telemetry};
use citegate_generation::{ChatMessage, Generator, TokenUsage};
use citegate_retrieval::{Hit, Retriever, UsedSnippet};

use crate::pipeline;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub telemetry: Arc<Telemetry>,
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn Generator>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/dryrun", get(dryrun_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

// -----------------------------
// Wire types
// -----------------------------

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub question: String,

    /// Retrieval breadth
    #[serde(default = "default_k")]
    pub k: usize,

    /// Completion length, hard-clamped to 256 before the backend sees it
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, hard-clamped to [0.0, 0.5]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// When true, the response carries the exact artifacts sent upstream
    #[serde(default)]
    pub debug: bool,
}

fn default_k() -> usize {
    4
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.1
}

/// Response of `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub latency_seconds: f64,
    pub usage: TokenUsage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Internal artifacts surfaced when `debug=true`.
#[derive(Debug, Serialize)]
pub struct DebugInfo {
    /// Exact messages sent to the backend
    pub messages: Vec<ChatMessage>,

    /// Evidence the model actually saw, with labels
    pub used_snippets: Vec<UsedSnippet>,

    /// Original retriever output, trimmed to the first 10 hits
    pub raw_hits: Vec<Hit>,

    /// Effective model parameters after clamping
    pub payload_model: String,
    pub payload_temperature: f32,
    pub payload_max_tokens: u32,
}

/// Query parameters of `GET /dryrun`.
#[derive(Debug, Deserialize)]
pub struct DryrunParams {
    pub question: String,

    #[serde(default = "default_k")]
    pub k: usize,
}

/// Response of `GET /dryrun`.
#[derive(Debug, Serialize)]
pub struct DryrunResponse {
    pub question: String,
    pub citations: Vec<String>,
    pub used_snippets: Vec<UsedSnippet>,
    pub messages: Vec<ChatMessage>,
    pub note: &'static str,
}

/// Response of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub retriever_url: String,
    pub generation_url: String,
    pub model_name: String,
}

// -----------------------------
// Error mapping
// -----------------------------

/// Handler-level error wrapper. Upstream failures map to 502, everything
/// else to 500; the body is a JSON object with the error message.
pub struct ApiError(pub AppError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Retrieval(_) | AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, "Request failed: {}", self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// -----------------------------
// Handlers
// -----------------------------

/// `GET /health` — always succeeds, performs no I/O.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        retriever_url: state.config.retriever_url.clone(),
        generation_url: state.config.generation_url.clone(),
        model_name: state.config.model_name.clone(),
    })
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.telemetry.render(),
    )
}

/// `GET /dryrun` — everything `/chat` would send, without calling the
/// generation backend.
async fn dryrun_handler(
    State(state): State<AppState>,
    Query(params): Query<DryrunParams>,
) -> Result<Json<DryrunResponse>, ApiError> {
    state.telemetry.inc_request("/dryrun");
    let response = pipeline::run_dryrun(&state, &params.question, params.k).await?;
    Ok(Json(response))
}

/// `POST /chat` — the full retrieval-to-answer pipeline.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    state.telemetry.inc_request("/chat");
    let response = pipeline::run_chat(&state, request).await?;
    Ok(Json(response))
}
