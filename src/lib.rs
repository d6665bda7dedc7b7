// lib.rs - Library root shared by the server binary and the tests
pub mod config;
pub mod db;
pub mod elevenlabs_client;
pub mod functions_client;
pub mod gemini_client;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod sessions;
pub mod storage_client;

use std::sync::Arc;

use pipeline::{PipelineServices, RenderSpecBuilder};
use sessions::SharedSessionManager;

/// Which external services got real credentials at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredServices {
    pub gemini: bool,
    pub elevenlabs: bool,
    pub storage: bool,
    pub functions: bool,
    pub remote_renderer: bool,
}

// AppState holds the database pool, the pipeline seams, the render stub and the live sessions
pub struct AppState {
    pub db_pool: Option<sqlx::PgPool>,
    pub services: PipelineServices,
    pub render_specs: Arc<RenderSpecBuilder>,
    pub sessions: SharedSessionManager,
    pub configured: ConfiguredServices,
}
