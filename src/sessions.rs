// src/sessions.rs
//! Registry of live pipeline sessions, one coordinator per editor session.
//! Dropping a session never deletes its video record.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::pipeline::VideoPipeline;

pub type SessionId = String;

#[derive(Clone)]
struct SessionEntry {
    pipeline: Arc<VideoPipeline>,
    created_at: DateTime<Utc>,
}

pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a coordinator and hand back its session id
    pub async fn create(&self, pipeline: VideoPipeline) -> (SessionId, Arc<VideoPipeline>) {
        let session_id = Uuid::new_v4().to_string();
        let pipeline = Arc::new(pipeline);
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id.clone(),
            SessionEntry {
                pipeline: pipeline.clone(),
                created_at: Utc::now(),
            },
        );
        tracing::info!(
            session_id = %session_id,
            question_id = pipeline.question().id,
            "🎬 Created pipeline session"
        );
        (session_id, pipeline)
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<VideoPipeline>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.pipeline.clone())
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Closed pipeline session");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop idle sessions older than `max_age_hours`. Sessions with a step in
    /// flight are kept. Returns how many were removed.
    pub async fn cleanup_old_sessions(&self, max_age_hours: i64) -> usize {
        let mut sessions = self.sessions.write().await;
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours);

        let to_remove: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| entry.created_at < cutoff && entry.pipeline.in_flight().is_none())
            .map(|(id, _)| id.clone())
            .collect();

        for session_id in &to_remove {
            sessions.remove(session_id);
            tracing::debug!("🗑️ Cleaned up old session: {}", session_id);
        }
        to_remove.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSessionManager = Arc<SessionManager>;
