use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::experiment::SessionError;
use crate::services::puzzle_attempt::AttemptError;
use crate::services::session_service::SessionServiceError;
use crate::services::AppState;

pub mod sessions;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = state.sessions.read().await.len();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "tone-experiment-api",
            "version": env!("CARGO_PKG_VERSION"),
            "sessions": sessions,
            "dependencies": {
                "hints": if state.config.hints.api_key.is_some() { "configured" } else { "placeholder" },
                "speech": if state.config.speech.enabled { "enabled" } else { "disabled" },
                "wordlist": state.lexicon.as_ref().map(|l| l.len()),
            }
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        let message = err.to_string();
        match err {
            SessionServiceError::NotFound(_) => ApiError::NotFound(message),
            SessionServiceError::HintDiscarded => ApiError::Conflict(message),
            SessionServiceError::Persistence(_) => ApiError::Internal(message),
            SessionServiceError::Session(inner) => match inner {
                SessionError::Attempt(AttemptError::EmptyGuess)
                | SessionError::Attempt(AttemptError::WrongLength { .. })
                | SessionError::NotInLexicon(_)
                | SessionError::Survey(_) => ApiError::Unprocessable(message),
                SessionError::Attempt(_)
                | SessionError::InvalidPhase { .. }
                | SessionError::SurveyNotAvailable
                | SessionError::GiveUpNotAllowed(_)
                | SessionError::FlushPending(_)
                | SessionError::Finished => ApiError::Conflict(message),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (
            status,
            Json(json!({
                "message": message,
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}
