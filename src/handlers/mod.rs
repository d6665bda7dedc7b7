// src/handlers/mod.rs
pub mod error;
pub mod pipeline;
pub mod render;
pub mod status;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::middleware;
use crate::AppState;

/// Build the application with all routes and shared state
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(pipeline::pipeline_routes())
        .merge(render::render_routes()) // 🎬 render function stub
        .merge(status::status_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
