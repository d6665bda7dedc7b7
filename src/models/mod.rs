// src/models/mod.rs
pub mod question;
pub mod video;

pub use question::{Question, FALLBACK_EXAM_NAME};
pub use video::{NewVideo, StageUpdate, VideoRecord, VideoStatus};
