// src/pipeline/services.rs
//! Seams between the coordinator and everything it talks to.
//!
//! Implementations return a boxed error; the coordinator decides which
//! `PipelineError` kind a failure becomes.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{NewVideo, Question, StageUpdate, VideoRecord};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Text-generation service used to draft the narration script.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Returns the first candidate's text, or an error when there is none.
    async fn write_script(&self, prompt: &str) -> Result<String, BoxError>;
}

/// Speech-synthesis service.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    async fn synthesize(&self, script: &str) -> Result<Vec<u8>, BoxError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BoxError>;

    fn public_url(&self, name: &str) -> String;
}

/// Captioning function. The payload it returns is opaque to the pipeline.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate_captions(
        &self,
        video_id: i64,
        audio_url: &str,
        script: &str,
    ) -> Result<serde_json::Value, BoxError>;
}

/// Rendering function; answers with the final video location.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, video_id: i64, template_id: i32) -> Result<String, BoxError>;
}

/// Record store for videos and the question bank.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn exam_name_for_course(&self, course_id: i64) -> Result<Option<String>, BoxError>;

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, BoxError>;

    async fn mark_question_used(&self, question_id: i64) -> Result<(), BoxError>;

    async fn insert_video(&self, video: NewVideo) -> Result<VideoRecord, BoxError>;

    async fn find_video(&self, video_id: i64) -> Result<Option<VideoRecord>, BoxError>;

    /// Persist a stage artifact and its status, returning the updated row.
    /// `None` when the record is gone or no longer at one of
    /// `update.expected_prior()`.
    async fn update_stage(
        &self,
        video_id: i64,
        update: StageUpdate,
    ) -> Result<Option<VideoRecord>, BoxError>;
}

/// Placeholder for a service whose credentials are missing. Every call fails
/// with a message naming the missing setting.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub &'static str);

impl Unconfigured {
    fn error(&self) -> BoxError {
        format!("{} is not configured", self.0).into()
    }
}

#[async_trait]
impl ScriptWriter for Unconfigured {
    async fn write_script(&self, _prompt: &str) -> Result<String, BoxError> {
        Err(self.error())
    }
}

#[async_trait]
impl VoiceSynthesizer for Unconfigured {
    async fn synthesize(&self, _script: &str) -> Result<Vec<u8>, BoxError> {
        Err(self.error())
    }
}

#[async_trait]
impl ObjectStorage for Unconfigured {
    async fn upload(
        &self,
        _name: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
        _upsert: bool,
    ) -> Result<(), BoxError> {
        Err(self.error())
    }

    fn public_url(&self, name: &str) -> String {
        name.to_string()
    }
}

#[async_trait]
impl CaptionGenerator for Unconfigured {
    async fn generate_captions(
        &self,
        _video_id: i64,
        _audio_url: &str,
        _script: &str,
    ) -> Result<serde_json::Value, BoxError> {
        Err(self.error())
    }
}

/// Everything one pipeline session needs, shared between sessions.
#[derive(Clone)]
pub struct PipelineServices {
    pub writer: Arc<dyn ScriptWriter>,
    pub voice: Arc<dyn VoiceSynthesizer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub captions: Arc<dyn CaptionGenerator>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub store: Arc<dyn VideoStore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_service_names_the_setting() {
        let voice = Unconfigured("ELEVEN_LABS_API_KEY");
        let err = voice.synthesize("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "ELEVEN_LABS_API_KEY is not configured");
    }
}
