//! REST API server for the SnapyX gateway
//!
//! Exposes the gateway via HTTP endpoints consumed by the browser UI.
//! Every response body is JSON; failures use `{error, timestamp}`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{ChatMessage, PostTier};
use crate::share;

const UNEXPECTED_ERROR: &str = "An unexpected error occurred";
const IMAGE_FAILURE: &str = "An error occurred while generating the image. Please try again.";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePostRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub user_input: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub text: Option<String>,
    pub url: Option<String>,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub result: String,
    pub used_web_search: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostReply {
    pub tweet: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReply {
    pub success: bool,
    pub image_url: String,
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareReply {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReply {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

impl ErrorReply {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            retry_after: None,
            details: None,
            timestamp: now(),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        } else {
            warn!(status = status.as_u16(), upstream = self.is_upstream(), "Request rejected: {}", self);
        }

        let mut body = ErrorReply::new(self.to_string());

        if let GatewayError::RateLimited { retry_after } = self {
            body.retry_after = Some(retry_after);
        }

        (status, Json(body)).into_response()
    }
}

/// Image endpoint failures: provider-side errors are reported generically
/// with the provider detail attached
struct ImageFailure(GatewayError);

impl IntoResponse for ImageFailure {
    fn into_response(self) -> Response {
        match self.0 {
            err @ (GatewayError::Configuration(_)
            | GatewayError::InvalidInput(_)
            | GatewayError::RateLimited { .. }
            | GatewayError::ContentPolicy) => err.into_response(),
            err => {
                error!("Image generation error: {}", err);
                let mut body = ErrorReply::new(IMAGE_FAILURE);
                body.details = Some(err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<GatewayError> for ImageFailure {
    fn from(err: GatewayError) -> Self {
        ImageFailure(err)
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| {
            GatewayError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
        })
}

/// Uncaught panics still answer with the JSON envelope
fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorReply::new(UNEXPECTED_ERROR)),
    )
        .into_response()
}

fn request_span(endpoint: &'static str) -> tracing::Span {
    info_span!("request", endpoint, request_id = %uuid::Uuid::new_v4())
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<Gateway>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": now()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, GatewayError> {
    run_chat(state, payload)
        .instrument(request_span("chat"))
        .await
}

async fn run_chat(
    state: ApiState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, GatewayError> {
    let req = body(payload)?;
    info!(turns = req.messages.len(), "Received chat request");

    let result = state.gateway.chat(&req.messages).await?;

    Ok(Json(ChatReply {
        result,
        used_web_search: false,
        timestamp: now(),
    }))
}

/// =============================
/// Post Endpoints
/// =============================

async fn post_handler(
    State(state): State<ApiState>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<PostReply>, GatewayError> {
    run_post(state, payload)
        .instrument(request_span("post"))
        .await
}

async fn run_post(
    state: ApiState,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<PostReply>, GatewayError> {
    let req = body(payload)?;
    let tier = PostTier::from_premium_flag(req.is_premium);
    info!(%tier, "Received post request");

    let tweet = state.gateway.generate_post(&req.user_input, tier).await?;

    Ok(Json(PostReply {
        tweet,
        timestamp: now(),
    }))
}

async fn simple_post_handler(
    State(state): State<ApiState>,
    payload: Result<Json<SimplePostRequest>, JsonRejection>,
) -> Result<Json<PostReply>, GatewayError> {
    run_simple_post(state, payload)
        .instrument(request_span("simple_post"))
        .await
}

async fn run_simple_post(
    state: ApiState,
    payload: Result<Json<SimplePostRequest>, JsonRejection>,
) -> Result<Json<PostReply>, GatewayError> {
    let req = body(payload)?;
    let tier = PostTier::from_premium_flag(req.is_premium);
    info!(%tier, "Received simple post request");

    let tweet = state.gateway.generate_simple_post(&req.prompt, tier).await?;

    Ok(Json(PostReply {
        tweet,
        timestamp: now(),
    }))
}

/// =============================
/// Image Endpoint
/// =============================

async fn image_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageReply>, ImageFailure> {
    run_image(state, payload)
        .instrument(request_span("image"))
        .await
}

async fn run_image(
    state: ApiState,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ImageReply>, ImageFailure> {
    let req = body(payload)?;
    info!("Received image generation request");

    let image = state.gateway.generate_image(&req.user_input).await?;

    Ok(Json(ImageReply {
        success: true,
        image_url: image.url,
        prompt: image.prompt_used,
    }))
}

/// =============================
/// Share Endpoint
/// =============================

async fn share_handler(
    query: Result<Query<ShareQuery>, QueryRejection>,
) -> Result<Json<ShareReply>, GatewayError> {
    let Query(query) = query.map_err(|rejection| {
        GatewayError::InvalidInput(format!("Invalid query: {}", rejection.body_text()))
    })?;

    let url = share::share_intent_url(query.text.as_deref(), query.url.as_deref())?;
    Ok(Json(ShareReply { url }))
}

/// =============================
/// Router
/// =============================

pub fn create_router(gateway: Arc<Gateway>) -> Router {
    let state = ApiState { gateway };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/grok", post(post_handler))
        .route("/api/tweet", post(simple_post_handler))
        .route("/api/generateImage", post(image_handler))
        .route("/api/share", get(share_handler))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    gateway: Arc<Gateway>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(gateway);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
