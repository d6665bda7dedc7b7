// src/handlers/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::pipeline::PipelineError;

#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    BadRequest(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Busy(_) | PipelineError::InvalidStage { .. } => StatusCode::CONFLICT,
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::InvalidTemplate(_) => StatusCode::BAD_REQUEST,
        PipelineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::Generation(_)
        | PipelineError::Synthesis(_)
        | PipelineError::Storage(_)
        | PipelineError::Captioning(_)
        | PipelineError::Render(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Pipeline(err) => (status_for(&err), err.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Operation, PipelineState};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&PipelineError::Busy(Operation::GenerateAudio)), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&PipelineError::InvalidStage {
                operation: Operation::RenderVideo,
                state: PipelineState::ScriptSaved
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&PipelineError::NotFound("Video record".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&PipelineError::Synthesis("401".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&PipelineError::Persistence("down".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&PipelineError::InvalidTemplate(9)), StatusCode::BAD_REQUEST);
    }
}
