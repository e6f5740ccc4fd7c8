//! JSON endpoints behind the chat and form pages.
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::svc::chat::ChatView;
use crate::web::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("session_id must be non-empty")]
    MissingSession,
    #[error("{0:#}")]
    Generation(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingSession => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Request body for POST /api/chat/submit.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub session_id: String,
    #[serde(default)]
    pub message: String,
}

/// Request body for POST /api/chat/input.
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub session_id: String,
    #[serde(default)]
    pub text: String,
}

/// Request body for the session-only chat endpoints.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

fn session_id(raw: &str) -> Result<&str, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::MissingSession);
    }
    Ok(id)
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<SessionRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let id = session_id(&query.session_id)?;
    Ok(Json(state.chat.view(id).await))
}

pub async fn input(
    State(state): State<AppState>,
    Json(body): Json<InputRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let id = session_id(&body.session_id)?;
    Ok(Json(state.chat.set_input(id, &body.text).await))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let id = session_id(&body.session_id)?;
    Ok(Json(state.chat.submit(id, &body.message).await))
}

pub async fn reply(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let id = session_id(&body.session_id)?;
    Ok(Json(state.chat.reply(id).await?))
}

pub async fn reset(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<ChatView>, ApiError> {
    let id = session_id(&body.session_id)?;
    Ok(Json(state.chat.reset(id).await))
}

pub async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let output = state.form.ask(&body.prompt).await?;
    Ok(Json(AskResponse { output }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model: state.model_name.to_string(),
    })
}
