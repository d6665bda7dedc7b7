use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Exam name used in the script when a course has no linked exam.
pub const FALLBACK_EXAM_NAME: &str = "this exam";

/// Quiz question the video is produced from. Read-only for the pipeline,
/// apart from the `used_in_video` marker.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub topic_id: Option<i64>,
    pub question_statement: String,
    pub question_type: String,
    pub options: Option<String>,
    pub answer: String,
    pub solution: Option<String>,
    pub used_in_video: Option<String>,
}

impl Question {
    /// Options text, treating an empty string the same as no options.
    pub fn options_text(&self) -> Option<&str> {
        self.options.as_deref().filter(|o| !o.trim().is_empty())
    }

    pub fn solution_text(&self) -> Option<&str> {
        self.solution.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn is_used(&self) -> bool {
        self.used_in_video.as_deref() == Some("yes")
    }
}
