// src/pipeline/stage.rs
//! Session-level pipeline states and the operations that move between them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{VideoRecord, VideoStatus};

/// Where a session stands. Derived from the current record on every call,
/// never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// No record and no draft yet.
    None,
    /// Script drafted in memory, not persisted.
    ScriptDrafted,
    ScriptSaved,
    AudioReady,
    CaptionsReady,
    VideoReady,
}

impl PipelineState {
    pub fn derive(video: Option<&VideoRecord>, has_draft: bool) -> Self {
        match video {
            None if has_draft => PipelineState::ScriptDrafted,
            None => PipelineState::None,
            Some(record) => match record.status {
                // Rows inserted by older tooling may still say `created`
                VideoStatus::Created if record.has_script() => PipelineState::ScriptSaved,
                VideoStatus::Created => PipelineState::None,
                VideoStatus::ScriptGenerated => PipelineState::ScriptSaved,
                VideoStatus::AudioGenerated => PipelineState::AudioReady,
                VideoStatus::CaptionsGenerated => PipelineState::CaptionsReady,
                VideoStatus::VideoRendered => PipelineState::VideoReady,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::None => "none",
            PipelineState::ScriptDrafted => "script_drafted",
            PipelineState::ScriptSaved => "script_saved",
            PipelineState::AudioReady => "audio_ready",
            PipelineState::CaptionsReady => "captions_ready",
            PipelineState::VideoReady => "video_ready",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Operation {
    DraftScript = 1,
    SaveScript = 2,
    GenerateAudio = 3,
    GenerateCaptions = 4,
    RenderVideo = 5,
}

impl Operation {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Operation::DraftScript),
            2 => Some(Operation::SaveScript),
            3 => Some(Operation::GenerateAudio),
            4 => Some(Operation::GenerateCaptions),
            5 => Some(Operation::RenderVideo),
            _ => None,
        }
    }

    /// Whether the operation may start from `state`.
    pub fn allowed_from(&self, state: PipelineState) -> bool {
        match self {
            // Redrafting replaces an unsaved draft
            Operation::DraftScript => {
                matches!(state, PipelineState::None | PipelineState::ScriptDrafted)
            }
            Operation::SaveScript => state == PipelineState::ScriptDrafted,
            Operation::GenerateAudio => state == PipelineState::ScriptSaved,
            Operation::GenerateCaptions => state == PipelineState::AudioReady,
            Operation::RenderVideo => state == PipelineState::CaptionsReady,
        }
    }

    pub fn step(&self) -> Step {
        match self {
            Operation::DraftScript | Operation::SaveScript => Step::Script,
            Operation::GenerateAudio => Step::Audio,
            Operation::GenerateCaptions => Step::Captions,
            Operation::RenderVideo => Step::Video,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::DraftScript => "draft script",
            Operation::SaveScript => "save script",
            Operation::GenerateAudio => "generate audio",
            Operation::GenerateCaptions => "generate captions",
            Operation::RenderVideo => "render video",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four user-visible steps of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Script,
    Audio,
    Captions,
    Video,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Script, Step::Audio, Step::Captions, Step::Video];

    /// First state in which the step counts as done.
    fn completed_at(&self) -> PipelineState {
        match self {
            Step::Script => PipelineState::ScriptSaved,
            Step::Audio => PipelineState::AudioReady,
            Step::Captions => PipelineState::CaptionsReady,
            Step::Video => PipelineState::VideoReady,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepView {
    pub step: Step,
    pub status: StepStatus,
}

pub fn step_views(state: PipelineState, in_flight: Option<Operation>) -> Vec<StepView> {
    Step::ALL
        .iter()
        .map(|&step| {
            let status = if state >= step.completed_at() {
                StepStatus::Completed
            } else if in_flight.map(|op| op.step()) == Some(step) {
                StepStatus::InProgress
            } else {
                StepStatus::Pending
            };
            StepView { step, status }
        })
        .collect()
}
