// src/config.rs
//! Runtime configuration read from the process environment.
//!
//! Credentials are only ever taken from here; nothing is compiled in.

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_STORAGE_BUCKET: &str = "videos";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub storage_bucket: String,
    pub functions_base_url: Option<String>,
    /// External renderer endpoint. When unset the render stub runs in process.
    pub render_function_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let supabase_url = get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string());
        let functions_base_url = get("FUNCTIONS_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .or_else(|| supabase_url.as_ref().map(|u| format!("{}/functions/v1", u)));

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            elevenlabs_api_key: get("ELEVEN_LABS_API_KEY"),
            elevenlabs_voice_id: get("ELEVEN_LABS_VOICE_ID"),
            supabase_url,
            supabase_service_key: get("SUPABASE_SERVICE_ROLE_KEY"),
            storage_bucket: get("STORAGE_BUCKET").unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            functions_base_url,
            render_function_url: get("RENDER_FUNCTION_URL"),
        })
    }

    /// Base used for public object URLs, including the render placeholder.
    pub fn public_base_url(&self) -> String {
        self.supabase_url.clone().unwrap_or_default()
    }
}
