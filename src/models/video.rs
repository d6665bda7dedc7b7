use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Stored pipeline stage of a video record. Variants are declared in
/// pipeline order, so `Ord` follows the order stages are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Created,
    ScriptGenerated,
    AudioGenerated,
    CaptionsGenerated,
    VideoRendered,
}

impl VideoStatus {
    pub const ALL: [VideoStatus; 5] = [
        VideoStatus::Created,
        VideoStatus::ScriptGenerated,
        VideoStatus::AudioGenerated,
        VideoStatus::CaptionsGenerated,
        VideoStatus::VideoRendered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Created => "created",
            VideoStatus::ScriptGenerated => "script_generated",
            VideoStatus::AudioGenerated => "audio_generated",
            VideoStatus::CaptionsGenerated => "captions_generated",
            VideoStatus::VideoRendered => "video_rendered",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown video status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for VideoStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for VideoStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One video being produced for one question (the pipeline's work item).
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: i64,
    pub course_id: i64,
    pub question_id: i64,
    pub script: Option<String>,
    pub audio_url: Option<String>,
    pub captions_data: Option<serde_json::Value>,
    pub video_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: VideoStatus,
    pub template_id: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl VideoRecord {
    pub fn has_script(&self) -> bool {
        self.script.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn has_audio(&self) -> bool {
        self.audio_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn has_captions(&self) -> bool {
        self.captions_data.as_ref().is_some_and(|c| !c.is_null())
    }
}

/// Values for inserting a freshly accepted script.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub course_id: i64,
    pub question_id: i64,
    pub script: String,
    pub template_id: i32,
}

/// Artifact produced by one stage together with the status it moves to.
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    Audio { audio_url: String },
    Captions { captions: serde_json::Value },
    Video { video_url: String },
}

impl StageUpdate {
    pub fn status(&self) -> VideoStatus {
        match self {
            StageUpdate::Audio { .. } => VideoStatus::AudioGenerated,
            StageUpdate::Captions { .. } => VideoStatus::CaptionsGenerated,
            StageUpdate::Video { .. } => VideoStatus::VideoRendered,
        }
    }

    /// Stored statuses the update may be applied on. A record that already
    /// moved past these is left alone, so the status never goes backward.
    pub fn expected_prior(&self) -> &'static [VideoStatus] {
        match self {
            // A `created` row that already carries a script counts as saved
            StageUpdate::Audio { .. } => &[VideoStatus::Created, VideoStatus::ScriptGenerated],
            StageUpdate::Captions { .. } => &[VideoStatus::AudioGenerated],
            StageUpdate::Video { .. } => &[VideoStatus::CaptionsGenerated],
        }
    }

    pub fn applies_to(&self, record: &VideoRecord) -> bool {
        self.expected_prior().contains(&record.status)
    }

    /// Apply the update to an in-memory record.
    pub fn apply(self, record: &mut VideoRecord) {
        record.status = self.status();
        match self {
            StageUpdate::Audio { audio_url } => record.audio_url = Some(audio_url),
            StageUpdate::Captions { captions } => record.captions_data = Some(captions),
            StageUpdate::Video { video_url } => record.video_url = Some(video_url),
        }
        record.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_wire_strings() {
        for status in VideoStatus::ALL {
            assert_eq!(status.as_str().parse::<VideoStatus>(), Ok(status));
        }
        assert!("rendering".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_stage_update_only_applies_to_its_predecessor() {
        let updates = [
            StageUpdate::Audio { audio_url: "a".to_string() },
            StageUpdate::Captions { captions: serde_json::json!({}) },
            StageUpdate::Video { video_url: "v".to_string() },
        ];
        for update in &updates {
            let target = update.status();
            for prior in update.expected_prior() {
                assert!(*prior < target);
            }
            assert!(!update.expected_prior().contains(&target));
            assert!(!update.expected_prior().contains(&VideoStatus::VideoRendered));
        }
        assert_eq!(updates[1].expected_prior(), &[VideoStatus::AudioGenerated]);
        assert_eq!(updates[2].expected_prior(), &[VideoStatus::CaptionsGenerated]);
    }

    #[test]
    fn test_status_order_matches_pipeline_order() {
        let mut sorted = VideoStatus::ALL;
        sorted.sort();
        assert_eq!(sorted, VideoStatus::ALL);
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&VideoStatus::CaptionsGenerated).unwrap();
        assert_eq!(json, "\"captions_generated\"");
    }
}
