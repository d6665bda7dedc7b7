// src/pipeline/error.rs
use thiserror::Error;

use super::stage::{Operation, PipelineState};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Script generation failed: {0}")]
    Generation(String),
    #[error("Database error: {0}")]
    Persistence(String),
    #[error("Voice-over generation failed: {0}")]
    Synthesis(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Caption generation failed: {0}")]
    Captioning(String),
    #[error("Video rendering failed: {0}")]
    Render(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Template id {0} is outside 1-5")]
    InvalidTemplate(i32),
    #[error("Cannot {operation} while pipeline is {state}")]
    InvalidStage {
        operation: Operation,
        state: PipelineState,
    },
    #[error("Another step ({0}) is still in progress")]
    Busy(Operation),
}
