// src/handlers/pipeline.rs
//! REST surface over the per-session pipeline coordinator. Handlers only
//! forward to the coordinator and return its snapshot.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::pipeline::{Operation, PipelineError, PipelineSnapshot, VideoPipeline};
use crate::sessions::SessionId;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub course_id: i64,
    pub question_id: i64,
    /// Resume an existing video record instead of starting fresh.
    pub video_id: Option<i64>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub snapshot: PipelineSnapshot,
}

pub fn pipeline_routes() -> Router {
    Router::new()
        .route("/api/pipeline/sessions", post(create_session))
        .route(
            "/api/pipeline/sessions/:session_id",
            get(get_session).delete(close_session),
        )
        .route("/api/pipeline/sessions/:session_id/script", post(draft_script))
        .route("/api/pipeline/sessions/:session_id/script/save", post(save_script))
        .route("/api/pipeline/sessions/:session_id/audio", post(generate_audio))
        .route("/api/pipeline/sessions/:session_id/captions", post(generate_captions))
        .route("/api/pipeline/sessions/:session_id/video", post(render_video))
}

/// POST /api/pipeline/sessions - Start (or resume) a session for one question
async fn create_session(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let store = &state.services.store;
    let question = store
        .find_question(request.question_id)
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?
        .ok_or_else(|| PipelineError::NotFound("Question".to_string()))?;

    let pipeline = match request.video_id {
        Some(video_id) => {
            let video = store
                .find_video(video_id)
                .await
                .map_err(|e| PipelineError::Persistence(e.to_string()))?
                .ok_or_else(|| PipelineError::NotFound("Video record".to_string()))?;
            if video.question_id != question.id {
                return Err(ApiError::BadRequest(format!(
                    "Video {} was made for question {}, not {}",
                    video.id, video.question_id, question.id
                )));
            }
            if video.course_id != request.course_id {
                return Err(ApiError::BadRequest(format!(
                    "Video {} belongs to course {}, not {}",
                    video.id, video.course_id, request.course_id
                )));
            }
            VideoPipeline::resume(question, video, state.services.clone())
        }
        None => VideoPipeline::new(request.course_id, question, state.services.clone()),
    };

    let (session_id, pipeline) = state.sessions.create(pipeline).await;
    let snapshot = pipeline.snapshot().await;
    Ok((StatusCode::CREATED, Json(SessionResponse { session_id, snapshot })))
}

/// GET /api/pipeline/sessions/:session_id - Current snapshot
async fn get_session(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let pipeline = find_session(&state, &session_id).await?;
    let snapshot = pipeline.snapshot().await;
    Ok(Json(SessionResponse { session_id, snapshot }))
}

/// DELETE /api/pipeline/sessions/:session_id - Forget the session (the record stays)
async fn close_session(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> StatusCode {
    if state.sessions.remove(&session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn draft_script(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    run_step(&state, session_id, Operation::DraftScript).await
}

async fn save_script(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    run_step(&state, session_id, Operation::SaveScript).await
}

async fn generate_audio(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    run_step(&state, session_id, Operation::GenerateAudio).await
}

async fn generate_captions(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    run_step(&state, session_id, Operation::GenerateCaptions).await
}

async fn render_video(
    Path(session_id): Path<SessionId>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    run_step(&state, session_id, Operation::RenderVideo).await
}

async fn run_step(
    state: &AppState,
    session_id: SessionId,
    operation: Operation,
) -> Result<Json<SessionResponse>, ApiError> {
    let pipeline = find_session(state, &session_id).await?;
    match operation {
        Operation::DraftScript => {
            pipeline.draft_script().await?;
        }
        Operation::SaveScript => {
            pipeline.save_script().await?;
        }
        Operation::GenerateAudio => {
            pipeline.generate_audio().await?;
        }
        Operation::GenerateCaptions => {
            pipeline.generate_captions().await?;
        }
        Operation::RenderVideo => {
            pipeline.render_video().await?;
        }
    }
    let snapshot = pipeline.snapshot().await;
    Ok(Json(SessionResponse { session_id, snapshot }))
}

async fn find_session(state: &AppState, session_id: &str) -> Result<Arc<VideoPipeline>, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| PipelineError::NotFound(format!("Session {}", session_id)).into())
}
