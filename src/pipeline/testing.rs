// src/pipeline/testing.rs
//! In-memory stand-ins for every pipeline seam, shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::coordinator::VideoPipeline;
use super::render_spec::{InProcessRenderer, RenderSpecBuilder};
use super::services::{
    BoxError, CaptionGenerator, ObjectStorage, PipelineServices, ScriptWriter, VideoStore,
    VoiceSynthesizer,
};
use crate::models::{NewVideo, Question, StageUpdate, VideoRecord, VideoStatus};

pub const PUBLIC_BASE_URL: &str = "https://proj.supabase.co";
pub const DEFAULT_SCRIPT: &str = "Hello everyone, today we are going to solve a question for JEE Main entrance exam. \
So the question says: What is 2+2? Try solving this question on your own. I'll give you 5 seconds. \
[COUNTDOWN: 5...4...3...2...1] The answer is: 4";

pub fn sample_question() -> Question {
    Question {
        id: 7,
        topic_id: Some(3),
        question_statement: "What is 2+2?".to_string(),
        question_type: "MCQ".to_string(),
        options: Some("A) 3 B) 4 C) 5 D) 22".to_string()),
        answer: "4".to_string(),
        solution: Some("2 plus 2 equals 4.".to_string()),
        used_in_video: None,
    }
}

pub struct MemoryStore {
    videos: Mutex<HashMap<i64, VideoRecord>>,
    questions: Mutex<HashMap<i64, Question>>,
    exam_names: HashMap<i64, String>,
    next_id: AtomicI64,
    pub insert_calls: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub fail_mark: AtomicBool,
    pub fail_update: AtomicBool,
}

impl MemoryStore {
    /// Question 7 plus course 1 linked to "JEE Main". Ids start at 42.
    pub fn seeded() -> Self {
        let question = sample_question();
        Self {
            videos: Mutex::new(HashMap::new()),
            questions: Mutex::new(HashMap::from([(question.id, question)])),
            exam_names: HashMap::from([(1, "JEE Main".to_string())]),
            next_id: AtomicI64::new(42),
            insert_calls: AtomicUsize::new(0),
            fail_insert: AtomicBool::new(false),
            fail_mark: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }

    pub fn question(&self, id: i64) -> Question {
        self.questions.lock().unwrap()[&id].clone()
    }

    pub fn video(&self, id: i64) -> VideoRecord {
        self.videos.lock().unwrap()[&id].clone()
    }

    pub fn put_video(&self, video: VideoRecord) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn remove_video(&self, id: i64) {
        self.videos.lock().unwrap().remove(&id);
    }

    /// Insert a record for question 7 with every artifact up to `status`.
    pub fn seed_video(&self, status: VideoStatus, template_id: i32) -> VideoRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let video = VideoRecord {
            id,
            course_id: 1,
            question_id: 7,
            script: (status >= VideoStatus::ScriptGenerated).then(|| DEFAULT_SCRIPT.to_string()),
            audio_url: (status >= VideoStatus::AudioGenerated)
                .then(|| format!("https://cdn.test/videos/audio_{}.mp3", id)),
            captions_data: (status >= VideoStatus::CaptionsGenerated).then(sample_captions),
            video_url: (status >= VideoStatus::VideoRendered)
                .then(|| format!("https://cdn.test/videos/video_{}.mp4", id)),
            status,
            template_id,
            created_at: now,
            updated_at: now,
        };
        self.put_video(video.clone());
        video
    }
}

fn sample_captions() -> serde_json::Value {
    json!({ "words": [{ "word": "Hello", "start": 0.0, "end": 0.4 }] })
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn exam_name_for_course(&self, course_id: i64) -> Result<Option<String>, BoxError> {
        Ok(self.exam_names.get(&course_id).cloned())
    }

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, BoxError> {
        Ok(self.questions.lock().unwrap().get(&question_id).cloned())
    }

    async fn mark_question_used(&self, question_id: i64) -> Result<(), BoxError> {
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err("connection reset while updating new_questions".into());
        }
        if let Some(question) = self.questions.lock().unwrap().get_mut(&question_id) {
            question.used_in_video = Some("yes".to_string());
        }
        Ok(())
    }

    async fn insert_video(&self, video: NewVideo) -> Result<VideoRecord, BoxError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err("insert into videos failed".into());
        }
        let now = Utc::now();
        let record = VideoRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            course_id: video.course_id,
            question_id: video.question_id,
            script: Some(video.script),
            audio_url: None,
            captions_data: None,
            video_url: None,
            status: VideoStatus::ScriptGenerated,
            template_id: video.template_id,
            created_at: now,
            updated_at: now,
        };
        self.put_video(record.clone());
        Ok(record)
    }

    async fn find_video(&self, video_id: i64) -> Result<Option<VideoRecord>, BoxError> {
        Ok(self.videos.lock().unwrap().get(&video_id).cloned())
    }

    async fn update_stage(
        &self,
        video_id: i64,
        update: StageUpdate,
    ) -> Result<Option<VideoRecord>, BoxError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err("update videos failed".into());
        }
        let mut videos = self.videos.lock().unwrap();
        match videos.get_mut(&video_id) {
            Some(record) if update.applies_to(&*record) => {
                update.apply(record);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }
}

pub struct FakeWriter {
    reply: Mutex<String>,
    prompts: Mutex<Vec<String>>,
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeWriter {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(DEFAULT_SCRIPT.to_string()),
            prompts: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = reply.to_string();
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    /// Make the next call signal `started` and then wait for `release`.
    pub fn gate(&self) -> (Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((started.clone(), release.clone()));
        (started, release)
    }
}

#[async_trait]
impl ScriptWriter for FakeWriter {
    async fn write_script(&self, prompt: &str) -> Result<String, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let gate = self.gate.lock().unwrap().take();
        if let Some((started, release)) = gate {
            started.notify_one();
            release.notified().await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err("Gemini API error: quota exceeded".into());
        }
        Ok(self.reply.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeVoice {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl VoiceSynthesizer for FakeVoice {
    async fn synthesize(&self, _script: &str) -> Result<Vec<u8>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("Eleven Labs TTS API error (401): invalid api key".into());
        }
        Ok(b"ID3-fake-mp3".to_vec())
    }
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, (Vec<u8>, String, bool)>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeStorage {
    pub fn object(&self, name: &str) -> Option<(Vec<u8>, String, bool)> {
        self.objects.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("bucket not found".into());
        }
        self.objects
            .lock()
            .unwrap()
            .insert(name.to_string(), (bytes, content_type.to_string(), upsert));
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("https://cdn.test/videos/{}", name)
    }
}

#[derive(Default)]
pub struct FakeCaptions {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl CaptionGenerator for FakeCaptions {
    async fn generate_captions(
        &self,
        _video_id: i64,
        _audio_url: &str,
        _script: &str,
    ) -> Result<serde_json::Value, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err("Caption function error (500): timeout".into());
        }
        Ok(sample_captions())
    }
}

/// Fakes wired together, with the in-process render stub as renderer.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub writer: Arc<FakeWriter>,
    pub voice: Arc<FakeVoice>,
    pub storage: Arc<FakeStorage>,
    pub captions: Arc<FakeCaptions>,
    pub render_specs: Arc<RenderSpecBuilder>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::seeded());
        let render_specs = Arc::new(RenderSpecBuilder::new(store.clone(), PUBLIC_BASE_URL));
        Self {
            store,
            writer: Arc::new(FakeWriter::new()),
            voice: Arc::new(FakeVoice::default()),
            storage: Arc::new(FakeStorage::default()),
            captions: Arc::new(FakeCaptions::default()),
            render_specs,
        }
    }

    pub fn services(&self) -> PipelineServices {
        PipelineServices {
            writer: self.writer.clone(),
            voice: self.voice.clone(),
            storage: self.storage.clone(),
            captions: self.captions.clone(),
            renderer: Arc::new(InProcessRenderer::new(self.render_specs.clone())),
            store: self.store.clone(),
        }
    }

    pub fn pipeline(&self) -> VideoPipeline {
        self.pipeline_for_course(1)
    }

    pub fn pipeline_for_course(&self, course_id: i64) -> VideoPipeline {
        VideoPipeline::new(course_id, self.store.question(7), self.services())
    }

    pub fn total_service_calls(&self) -> usize {
        self.writer.calls.load(Ordering::SeqCst)
            + self.voice.calls.load(Ordering::SeqCst)
            + self.storage.calls.load(Ordering::SeqCst)
            + self.captions.calls.load(Ordering::SeqCst)
    }
}
