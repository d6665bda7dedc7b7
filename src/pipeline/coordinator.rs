// src/pipeline/coordinator.rs
//! Per-session coordinator for the script -> audio -> captions -> video flow.
//!
//! A `VideoPipeline` owns everything one editor session knows: the question,
//! an unsaved draft, the current video record, the last error and the single
//! in-flight marker. Every operation re-derives the pipeline state from the
//! record before touching any service.

use rand::Rng;
use serde::Serialize;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Mutex;

use super::error::PipelineError;
use super::prompt::build_script_prompt;
use super::services::PipelineServices;
use super::stage::{step_views, Operation, PipelineState, StepView};
use crate::models::{NewVideo, Question, StageUpdate, VideoRecord, FALLBACK_EXAM_NAME};

pub const TEMPLATE_IDS: RangeInclusive<i32> = 1..=5;
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

const IDLE: u8 = 0;

pub fn pick_template_id<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(TEMPLATE_IDS)
}

pub fn audio_object_name(video_id: i64) -> String {
    format!("audio_{}.mp3", video_id)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DraftedScript {
    pub text: String,
    pub exam_name: String,
}

/// Read-only view of a session for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub course_id: i64,
    pub question_id: i64,
    pub state: PipelineState,
    pub steps: Vec<StepView>,
    pub in_flight: Option<Operation>,
    pub drafted_script: Option<DraftedScript>,
    pub video: Option<VideoRecord>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    drafted: Option<DraftedScript>,
    video: Option<VideoRecord>,
    last_error: Option<String>,
}

impl SessionState {
    fn pipeline_state(&self) -> PipelineState {
        PipelineState::derive(self.video.as_ref(), self.drafted.is_some())
    }
}

/// Clears the in-flight marker when dropped, even if the operation future is abandoned.
struct InFlight<'a> {
    slot: &'a AtomicU8,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slot.store(IDLE, Ordering::Release);
    }
}

pub struct VideoPipeline {
    course_id: i64,
    question: Question,
    services: PipelineServices,
    in_flight: AtomicU8,
    session: Mutex<SessionState>,
}

impl VideoPipeline {
    pub fn new(course_id: i64, question: Question, services: PipelineServices) -> Self {
        Self {
            course_id,
            question,
            services,
            in_flight: AtomicU8::new(IDLE),
            session: Mutex::new(SessionState::default()),
        }
    }

    /// Pick up a video record that already exists, e.g. after a restart.
    pub fn resume(question: Question, video: VideoRecord, services: PipelineServices) -> Self {
        Self {
            course_id: video.course_id,
            question,
            services,
            in_flight: AtomicU8::new(IDLE),
            session: Mutex::new(SessionState {
                video: Some(video),
                ..SessionState::default()
            }),
        }
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn in_flight(&self) -> Option<Operation> {
        Operation::from_u8(self.in_flight.load(Ordering::Acquire))
    }

    pub async fn state(&self) -> PipelineState {
        self.session.lock().await.pipeline_state()
    }

    pub async fn video(&self) -> Option<VideoRecord> {
        self.session.lock().await.video.clone()
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        let in_flight = self.in_flight();
        let session = self.session.lock().await;
        let state = session.pipeline_state();
        PipelineSnapshot {
            course_id: self.course_id,
            question_id: self.question.id,
            state,
            steps: step_views(state, in_flight),
            in_flight,
            drafted_script: session.drafted.clone(),
            video: session.video.clone(),
            last_error: session.last_error.clone(),
        }
    }

    /// Step 1: ask the text-generation service for a script. The draft stays
    /// in memory until `save_script`.
    pub async fn draft_script(&self) -> Result<DraftedScript, PipelineError> {
        self.run(Operation::DraftScript, async {
            self.require(Operation::DraftScript).await?;

            let exam_name = self.resolve_exam_name().await;
            let prompt = build_script_prompt(&self.question, &exam_name);
            tracing::info!(
                question_id = self.question.id,
                exam = %exam_name,
                "📝 Generating video script"
            );

            let text = self
                .services
                .writer
                .write_script(&prompt)
                .await
                .map_err(|e| PipelineError::Generation(e.to_string()))?;
            if text.trim().is_empty() {
                return Err(PipelineError::Generation("No script generated".to_string()));
            }

            let draft = DraftedScript { text, exam_name };
            self.session.lock().await.drafted = Some(draft.clone());
            tracing::info!(
                question_id = self.question.id,
                words = draft.text.split_whitespace().count(),
                "✅ Script drafted"
            );
            Ok(draft)
        })
        .await
    }

    /// Step 1b: persist the draft as a new video record.
    pub async fn save_script(&self) -> Result<VideoRecord, PipelineError> {
        self.run(Operation::SaveScript, async {
            let input = self.require(Operation::SaveScript).await?;
            let draft = input.drafted.ok_or(PipelineError::InvalidStage {
                operation: Operation::SaveScript,
                state: input.state,
            })?;

            let template_id = pick_template_id(&mut rand::thread_rng());
            let record = self
                .services
                .store
                .insert_video(NewVideo {
                    course_id: self.course_id,
                    question_id: self.question.id,
                    script: draft.text,
                    template_id,
                })
                .await
                .map_err(|e| PipelineError::Persistence(e.to_string()))?;

            self.mark_question_used().await;

            let mut session = self.session.lock().await;
            session.video = Some(record.clone());
            session.drafted = None;
            tracing::info!(video_id = record.id, template_id, "💾 Script saved");
            Ok(record)
        })
        .await
    }

    /// Step 2: synthesize the narration, upload it and record its public URL.
    pub async fn generate_audio(&self) -> Result<VideoRecord, PipelineError> {
        self.run(Operation::GenerateAudio, async {
            let video = self.require_video(Operation::GenerateAudio).await?;
            let script = video.script.clone().unwrap_or_default();

            tracing::info!(video_id = video.id, "🎙️ Generating voice-over");
            let audio = self
                .services
                .voice
                .synthesize(&script)
                .await
                .map_err(|e| PipelineError::Synthesis(e.to_string()))?;

            let object_name = audio_object_name(video.id);
            self.services
                .storage
                .upload(&object_name, audio, AUDIO_CONTENT_TYPE, true)
                .await
                .map_err(|e| PipelineError::Storage(e.to_string()))?;
            let audio_url = self.services.storage.public_url(&object_name);

            self.advance(Operation::GenerateAudio, video.id, StageUpdate::Audio { audio_url })
                .await
        })
        .await
    }

    /// Step 3: have the captioning function time the script against the audio.
    pub async fn generate_captions(&self) -> Result<VideoRecord, PipelineError> {
        self.run(Operation::GenerateCaptions, async {
            let video = self.require_video(Operation::GenerateCaptions).await?;
            let audio_url = video.audio_url.clone().unwrap_or_default();
            let script = video.script.clone().unwrap_or_default();

            tracing::info!(video_id = video.id, "💬 Generating captions");
            let captions = self
                .services
                .captions
                .generate_captions(video.id, &audio_url, &script)
                .await
                .map_err(|e| PipelineError::Captioning(e.to_string()))?;

            self.advance(Operation::GenerateCaptions, video.id, StageUpdate::Captions { captions })
                .await
        })
        .await
    }

    /// Step 4: hand the record to the renderer and store the final video URL.
    pub async fn render_video(&self) -> Result<VideoRecord, PipelineError> {
        self.run(Operation::RenderVideo, async {
            let video = self.require_video(Operation::RenderVideo).await?;

            tracing::info!(video_id = video.id, template_id = video.template_id, "🎬 Rendering video");
            let video_url = self
                .services
                .renderer
                .render(video.id, video.template_id)
                .await
                .map_err(|e| PipelineError::Render(e.to_string()))?;

            self.advance(Operation::RenderVideo, video.id, StageUpdate::Video { video_url })
                .await
        })
        .await
    }

    /// Gate an operation on the in-flight marker and record its outcome.
    async fn run<T, F>(&self, operation: Operation, work: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let _in_flight = self.begin(operation)?;
        self.session.lock().await.last_error = None;

        let result = work.await;
        if let Err(e) = &result {
            tracing::error!(
                question_id = self.question.id,
                operation = %operation,
                "❌ Pipeline step failed: {}",
                e
            );
            self.session.lock().await.last_error = Some(e.to_string());
        }
        result
    }

    fn begin(&self, operation: Operation) -> Result<InFlight<'_>, PipelineError> {
        match self
            .in_flight
            .compare_exchange(IDLE, operation as u8, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(InFlight { slot: &self.in_flight }),
            Err(current) => {
                let running = Operation::from_u8(current).unwrap_or(operation);
                tracing::warn!(
                    question_id = self.question.id,
                    requested = %operation,
                    running = %running,
                    "Rejected pipeline step while another is in flight"
                );
                Err(PipelineError::Busy(running))
            }
        }
    }

    /// Check the derived state and hand back a copy of what the step needs.
    async fn require(&self, operation: Operation) -> Result<StepInput, PipelineError> {
        let session = self.session.lock().await;
        let state = session.pipeline_state();
        if !operation.allowed_from(state) {
            return Err(PipelineError::InvalidStage { operation, state });
        }
        Ok(StepInput {
            state,
            drafted: session.drafted.clone(),
            video: session.video.clone(),
        })
    }

    /// Like `require`, but also insists the predecessor's artifact is present.
    async fn require_video(&self, operation: Operation) -> Result<VideoRecord, PipelineError> {
        let input = self.require(operation).await?;
        let state = input.state;
        let video = input
            .video
            .ok_or(PipelineError::InvalidStage { operation, state })?;

        let has_input = match operation {
            Operation::GenerateAudio => video.has_script(),
            Operation::GenerateCaptions => video.has_audio(),
            Operation::RenderVideo => video.has_captions(),
            Operation::DraftScript | Operation::SaveScript => true,
        };
        if !has_input {
            return Err(PipelineError::InvalidStage { operation, state });
        }
        Ok(video)
    }

    async fn advance(
        &self,
        operation: Operation,
        video_id: i64,
        update: StageUpdate,
    ) -> Result<VideoRecord, PipelineError> {
        let status = update.status();
        let updated = self
            .services
            .store
            .update_stage(video_id, update)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        let Some(record) = updated else {
            return Err(self.resync(operation, video_id).await);
        };

        self.session.lock().await.video = Some(record.clone());
        tracing::info!(video_id, status = %status, "✅ Pipeline stage advanced");
        Ok(record)
    }

    /// The stored record moved on without this session. Reload it so the
    /// session reports the real stage, and reject the step.
    async fn resync(&self, operation: Operation, video_id: i64) -> PipelineError {
        match self.services.store.find_video(video_id).await {
            Ok(Some(current)) => {
                let mut session = self.session.lock().await;
                session.video = Some(current);
                let state = session.pipeline_state();
                tracing::warn!(
                    video_id,
                    operation = %operation,
                    state = %state,
                    "Video record advanced outside this session"
                );
                PipelineError::InvalidStage { operation, state }
            }
            Ok(None) => PipelineError::NotFound("Video record".to_string()),
            Err(e) => PipelineError::Persistence(e.to_string()),
        }
    }

    async fn resolve_exam_name(&self) -> String {
        match self.services.store.exam_name_for_course(self.course_id).await {
            Ok(Some(name)) => name,
            Ok(None) => FALLBACK_EXAM_NAME.to_string(),
            Err(e) => {
                tracing::warn!(course_id = self.course_id, "Failed to resolve exam name: {}", e);
                FALLBACK_EXAM_NAME.to_string()
            }
        }
    }

    /// Best effort: a failure here never undoes the saved script.
    async fn mark_question_used(&self) {
        if let Err(e) = self.services.store.mark_question_used(self.question.id).await {
            tracing::warn!(
                question_id = self.question.id,
                "Failed to mark question as used in video: {}",
                e
            );
        }
    }
}

struct StepInput {
    state: PipelineState,
    drafted: Option<DraftedScript>,
    video: Option<VideoRecord>,
}
