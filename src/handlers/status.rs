// src/handlers/status.rs
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

fn configured(flag: bool) -> &'static str {
    if flag {
        "configured"
    } else {
        "not_configured"
    }
}

/// GET /api/status - Service configuration and health
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_status = match &state.db_pool {
        Some(pool) => match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => "healthy",
            Err(_) => "unhealthy",
        },
        None => "not_configured",
    };
    let services = &state.configured;

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "gemini_ai": configured(services.gemini),
            "elevenlabs_audio": configured(services.elevenlabs),
            "object_storage": configured(services.storage),
            "functions": configured(services.functions),
            "renderer": if services.remote_renderer { "remote" } else { "in_process" }
        },
        "active_sessions": state.sessions.len().await
    }))
}
