// src/pipeline/render_spec.rs
//! Render stub: assembles the declarative document an external renderer
//! will consume and answers with a placeholder video location.
//!
//! No media is produced here. The returned URL points at where the
//! renderer is expected to upload its output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::coordinator::TEMPLATE_IDS;
use super::error::PipelineError;
use super::prompt::{COUNTDOWN_MARKER, COUNTDOWN_SECONDS};
use super::services::{BoxError, VideoRenderer, VideoStore};
use crate::config::DEFAULT_STORAGE_BUCKET;
use crate::models::{Question, VideoRecord};

pub const RENDER_MESSAGE: &str =
    "Video rendering specification prepared. Ready for Python backend integration.";

pub const NEXT_STEPS: [&str; 8] = [
    "1. Python backend will download audio from audio_url",
    "2. Load template background (1-5)",
    "3. Overlay audio track",
    "4. Add captions with word-by-word highlighting",
    "5. Insert countdown section with question display",
    "6. Show answer and solution after countdown",
    "7. Render final video with MoviePy + FFmpeg",
    "8. Upload to Supabase storage and return URL",
];

pub fn placeholder_artifact_name(video_id: i64, template_id: i32) -> String {
    format!("video_{}_template_{}", video_id, template_id)
}

pub fn placeholder_video_url(base_url: &str, bucket: &str, video_id: i64, template_id: i32) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}.mp4",
        base_url.trim_end_matches('/'),
        bucket,
        placeholder_artifact_name(video_id, template_id)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionData {
    pub statement: String,
    pub options: Option<String>,
    pub answer: String,
    pub solution: Option<String>,
}

impl From<&Question> for QuestionData {
    fn from(question: &Question) -> Self {
        Self {
            statement: question.question_statement.clone(),
            options: question.options.clone(),
            answer: question.answer.clone(),
            solution: question.solution.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackgroundInstruction {
    pub template_id: i32,
    pub rotation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptionInstruction {
    pub highlight: String,
    pub highlight_color: String,
    pub style_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountdownInstruction {
    pub trigger_marker: String,
    pub seconds: u32,
    pub show_question: bool,
    pub show_options: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRevealInstruction {
    pub after: String,
    pub checkmark_color: String,
    pub show_solution: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportTarget {
    pub container: String,
    pub resolution: String,
    pub fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderInstructions {
    pub background: BackgroundInstruction,
    pub audio: String,
    pub captions: CaptionInstruction,
    pub countdown: CountdownInstruction,
    pub answer_reveal: AnswerRevealInstruction,
    pub export: ExportTarget,
}

impl RenderInstructions {
    pub fn for_template(template_id: i32, question: &Question) -> Self {
        Self {
            background: BackgroundInstruction {
                template_id,
                rotation: format!(
                    "background {} of {}-{}",
                    template_id,
                    TEMPLATE_IDS.start(),
                    TEMPLATE_IDS.end()
                ),
            },
            audio: "Overlay voice-over audio from audio_url".to_string(),
            captions: CaptionInstruction {
                highlight: "word".to_string(),
                highlight_color: "yellow".to_string(),
                style_format: "ASS".to_string(),
            },
            countdown: CountdownInstruction {
                trigger_marker: COUNTDOWN_MARKER.to_string(),
                seconds: COUNTDOWN_SECONDS,
                show_question: true,
                show_options: question.options_text().is_some(),
            },
            answer_reveal: AnswerRevealInstruction {
                after: "countdown".to_string(),
                checkmark_color: "green".to_string(),
                show_solution: question.solution_text().is_some(),
            },
            export: ExportTarget {
                container: "mp4".to_string(),
                resolution: "1080p".to_string(),
                fps: 30,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSpec {
    pub video_id: i64,
    pub template_id: i32,
    pub audio_url: Option<String>,
    pub captions: Option<serde_json::Value>,
    pub question_data: QuestionData,
    pub instructions: RenderInstructions,
}

impl RenderSpec {
    pub fn new(video: &VideoRecord, question: &Question, template_id: i32) -> Self {
        Self {
            video_id: video.id,
            template_id,
            audio_url: video.audio_url.clone(),
            captions: video.captions_data.clone(),
            question_data: QuestionData::from(question),
            instructions: RenderInstructions::for_template(template_id, question),
        }
    }
}

/// What the render endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderOutcome {
    pub success: bool,
    pub video_url: String,
    pub message: String,
    pub render_spec: RenderSpec,
    pub next_steps: Vec<String>,
}

pub struct RenderSpecBuilder {
    store: Arc<dyn VideoStore>,
    public_base_url: String,
    bucket: String,
}

impl RenderSpecBuilder {
    pub fn new(store: Arc<dyn VideoStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub async fn build(&self, video_id: i64, template_id: i32) -> Result<RenderOutcome, PipelineError> {
        if !TEMPLATE_IDS.contains(&template_id) {
            return Err(PipelineError::InvalidTemplate(template_id));
        }

        let video = self
            .store
            .find_video(video_id)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?
            .ok_or_else(|| PipelineError::NotFound("Video record".to_string()))?;

        let question = self
            .store
            .find_question(video.question_id)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?
            .ok_or_else(|| PipelineError::NotFound("Question data".to_string()))?;

        let render_spec = RenderSpec::new(&video, &question, template_id);
        let video_url = placeholder_video_url(&self.public_base_url, &self.bucket, video_id, template_id);

        tracing::info!(
            video_id,
            template_id,
            has_audio = video.has_audio(),
            has_captions = video.has_captions(),
            "🧾 Render specification prepared (no media rendered)"
        );

        Ok(RenderOutcome {
            success: true,
            video_url,
            message: RENDER_MESSAGE.to_string(),
            render_spec,
            next_steps: NEXT_STEPS.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Renderer that calls the stub directly instead of over HTTP.
pub struct InProcessRenderer {
    builder: Arc<RenderSpecBuilder>,
}

impl InProcessRenderer {
    pub fn new(builder: Arc<RenderSpecBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl VideoRenderer for InProcessRenderer {
    async fn render(&self, video_id: i64, template_id: i32) -> Result<String, BoxError> {
        Ok(self.builder.build(video_id, template_id).await?.video_url)
    }
}
