// src/pipeline/mod.rs
//! Video creation pipeline: script -> voice-over -> captions -> rendered video.

pub mod coordinator;
pub mod error;
pub mod prompt;
pub mod render_spec;
pub mod services;
pub mod stage;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use coordinator::{DraftedScript, PipelineSnapshot, VideoPipeline};
pub use error::PipelineError;
pub use render_spec::{InProcessRenderer, RenderOutcome, RenderSpec, RenderSpecBuilder};
pub use services::{BoxError, PipelineServices};
pub use stage::{Operation, PipelineState};
pub use store::PgVideoStore;
