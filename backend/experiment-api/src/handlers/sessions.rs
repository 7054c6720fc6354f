use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::ApiError;
use crate::extractors::AppJson;
use crate::models::session::{CreateSessionRequest, SubmitGuessRequest, SubmitSurveyRequest};
use crate::services::{session_service::SessionService, AppState};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate request
    if let Err(e) = req.validate() {
        return Err(ApiError::BadRequest(format!("Validation error: {}", e)));
    }

    tracing::info!("Creating session for participant_id={}", req.participant_id);

    let service = SessionService::new(state);
    let snapshot = service.create_session(req).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    Ok(Json(service.get_session(session_id).await?))
}

pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<SubmitGuessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    Ok(Json(service.submit_guess(session_id, &req.guess).await?))
}

pub async fn request_hint(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Hint requested: session={}", session_id);

    let service = SessionService::new(state);
    Ok(Json(service.request_hint(session_id).await?))
}

pub async fn give_up(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    Ok(Json(service.give_up(session_id).await?))
}

pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    Ok(Json(service.survey_questions(session_id).await?))
}

/// 202 when the survey was accepted but the finished block could not be
/// saved yet; `POST /advance` retries the save.
pub async fn submit_survey(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<SubmitSurveyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Err(e) = req.validate() {
        return Err(ApiError::BadRequest(format!("Validation error: {}", e)));
    }

    let service = SessionService::new(state);
    let snapshot = service.submit_survey(session_id, &req.answers).await?;
    let status = if snapshot.flush_pending {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(snapshot)))
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    Ok(Json(service.advance(session_id).await?))
}

/// Latest synthesized clip as `audio/mpeg`, or 204 while nothing is ready.
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let service = SessionService::new(state);
    match service.current_audio(session_id).await? {
        Some(clip) => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/mpeg".to_string()),
                (header::ETAG, format!("\"{}\"", clip.sequence)),
            ],
            clip.bytes.clone(),
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn stop_audio(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state);
    service.stop_audio(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
