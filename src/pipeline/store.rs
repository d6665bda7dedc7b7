// src/pipeline/store.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::services::{BoxError, VideoStore};
use crate::models::{NewVideo, Question, StageUpdate, VideoRecord, VideoStatus};

/// Record store backed by the Postgres tables from `migrations/`.
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn exam_name_for_course(&self, course_id: i64) -> Result<Option<String>, BoxError> {
        let name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT e.name
            FROM courses c
            JOIN exams e ON e.id = c.exam_id
            WHERE c.id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(name)
    }

    async fn find_question(&self, question_id: i64) -> Result<Option<Question>, BoxError> {
        let question = sqlx::query_as::<_, Question>(
            "SELECT id, topic_id, question_statement, question_type, options, answer, solution, used_in_video
             FROM new_questions WHERE id = $1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn mark_question_used(&self, question_id: i64) -> Result<(), BoxError> {
        sqlx::query("UPDATE new_questions SET used_in_video = 'yes' WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_video(&self, video: NewVideo) -> Result<VideoRecord, BoxError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            INSERT INTO videos (course_id, question_id, script, status, template_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(video.course_id)
        .bind(video.question_id)
        .bind(video.script)
        .bind(VideoStatus::ScriptGenerated.as_str())
        .bind(video.template_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_video(&self, video_id: i64) -> Result<Option<VideoRecord>, BoxError> {
        let record = sqlx::query_as::<_, VideoRecord>("SELECT * FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn update_stage(
        &self,
        video_id: i64,
        update: StageUpdate,
    ) -> Result<Option<VideoRecord>, BoxError> {
        let status = update.status();
        let prior: Vec<String> = update
            .expected_prior()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        // The status guard keeps a stale session from moving the row backward
        let query = match update {
            StageUpdate::Audio { audio_url } => sqlx::query_as::<_, VideoRecord>(
                "UPDATE videos SET audio_url = $1, status = $2, updated_at = $3
                 WHERE id = $4 AND status = ANY($5) RETURNING *",
            )
            .bind(audio_url),
            StageUpdate::Captions { captions } => sqlx::query_as::<_, VideoRecord>(
                "UPDATE videos SET captions_data = $1, status = $2, updated_at = $3
                 WHERE id = $4 AND status = ANY($5) RETURNING *",
            )
            .bind(captions),
            StageUpdate::Video { video_url } => sqlx::query_as::<_, VideoRecord>(
                "UPDATE videos SET video_url = $1, status = $2, updated_at = $3
                 WHERE id = $4 AND status = ANY($5) RETURNING *",
            )
            .bind(video_url),
        };

        let record = query
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(video_id)
            .bind(prior)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }
}
