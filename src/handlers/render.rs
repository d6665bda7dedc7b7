// src/handlers/render.rs
//! Render function endpoint. Answers with the render specification and a
//! placeholder video URL; no media is rendered.

use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::functions_client::RenderRequest;
use crate::AppState;

pub fn render_routes() -> Router {
    Router::new().route("/functions/v1/render-video", post(render_video))
}

/// POST /functions/v1/render-video - Build the render specification
async fn render_video(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RenderRequest>,
) -> Response {
    match state
        .render_specs
        .build(request.video_id, request.template_id)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            tracing::error!(
                video_id = request.video_id,
                template_id = request.template_id,
                "Render specification failed: {}",
                e
            );
            ApiError::from(e).into_response()
        }
    }
}
