use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{
    AudioIssue, DocumentId, JobId, JobStatus, MeetingId, OwnerId, TranscriptionJob,
};

const TERMINAL_GUARD: &str = "status NOT IN ('COMPLETED', 'FAILED')";

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &TranscriptionJob) -> Result<(), JobStoreError> {
        let issues: Vec<String> = job.audio_issues.iter().map(|i| i.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO transcription_jobs
                (id, owner_id, source_url, title, meeting_id, status, progress,
                 progress_message, include_sentiment, identify_speakers, created_at,
                 completed_at, error_message, result_document_id, audio_issues, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.owner_id.as_uuid())
        .bind(&job.source_url)
        .bind(&job.title)
        .bind(job.meeting_id.map(|m| m.as_uuid()))
        .bind(job.status.as_str())
        .bind(job.progress as i32)
        .bind(&job.progress_message)
        .bind(job.include_sentiment)
        .bind(job.identify_speakers)
        .bind(job.created_at)
        .bind(job.completed_at)
        .bind(&job.error_message)
        .bind(job.result_document_id.map(|d| d.as_uuid()))
        .bind(&issues)
        .bind(&job.metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<TranscriptionJob>, JobStoreError> {
        let row = sqlx::query("SELECT * FROM transcription_jobs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        row.map(|r| map_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(owner_id = %owner))]
    async fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<TranscriptionJob>, JobStoreError> {
        let rows = sqlx::query(
            "SELECT * FROM transcription_jobs WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        rows.iter().map(map_row).collect()
    }

    #[instrument(skip(self, message), fields(job_id = %id, status = %status))]
    async fn update_progress(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError> {
        let result = sqlx::query(&format!(
            "UPDATE transcription_jobs
             SET status = $1, progress = $2, progress_message = $3
             WHERE id = $4 AND {}",
            TERMINAL_GUARD
        ))
        .bind(status.as_str())
        .bind(progress.min(100) as i32)
        .bind(message)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        guard_updated(result.rows_affected(), id)
    }

    #[instrument(skip(self, issues), fields(job_id = %id))]
    async fn set_audio_issues(&self, id: JobId, issues: &[AudioIssue]) -> Result<(), JobStoreError> {
        let tags: Vec<String> = issues.iter().map(|i| i.to_string()).collect();

        let result = sqlx::query(&format!(
            "UPDATE transcription_jobs SET audio_issues = $1 WHERE id = $2 AND {}",
            TERMINAL_GUARD
        ))
        .bind(&tags)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        guard_updated(result.rows_affected(), id)
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn mark_completed(&self, id: JobId, document_id: DocumentId) -> Result<(), JobStoreError> {
        let result = sqlx::query(&format!(
            "UPDATE transcription_jobs
             SET status = 'COMPLETED', progress = 100, progress_message = 'Completed',
                 result_document_id = $1, completed_at = $2
             WHERE id = $3 AND {}",
            TERMINAL_GUARD
        ))
        .bind(document_id.as_uuid())
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        guard_updated(result.rows_affected(), id)
    }

    #[instrument(skip(self, error), fields(job_id = %id))]
    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), JobStoreError> {
        let result = sqlx::query(&format!(
            "UPDATE transcription_jobs
             SET status = 'FAILED', error_message = $1, completed_at = $2
             WHERE id = $3 AND {}",
            TERMINAL_GUARD
        ))
        .bind(error)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| JobStoreError::QueryFailed(e.to_string()))?;

        guard_updated(result.rows_affected(), id)
    }
}

fn guard_updated(rows_affected: u64, id: JobId) -> Result<(), JobStoreError> {
    if rows_affected == 0 {
        return Err(JobStoreError::ConstraintViolation(format!(
            "job {} is terminal or missing",
            id
        )));
    }
    Ok(())
}

fn map_row(row: &PgRow) -> Result<TranscriptionJob, JobStoreError> {
    let status: String = get(row, "status")?;
    let status = status.parse::<JobStatus>().map_err(JobStoreError::QueryFailed)?;

    let issues: Vec<String> = get(row, "audio_issues")?;
    let audio_issues = issues
        .iter()
        .filter_map(|tag| tag.parse::<AudioIssue>().ok())
        .collect();

    let progress: i32 = get(row, "progress")?;
    let meeting_id: Option<Uuid> = get(row, "meeting_id")?;
    let result_document_id: Option<Uuid> = get(row, "result_document_id")?;
    let completed_at: Option<DateTime<Utc>> = get(row, "completed_at")?;
    let metadata: Option<serde_json::Value> = get(row, "metadata")?;

    Ok(TranscriptionJob {
        id: JobId::from_uuid(get(row, "id")?),
        owner_id: OwnerId::from_uuid(get(row, "owner_id")?),
        source_url: get(row, "source_url")?,
        title: get(row, "title")?,
        meeting_id: meeting_id.map(MeetingId::from_uuid),
        status,
        progress: progress.clamp(0, 100) as u8,
        progress_message: get(row, "progress_message")?,
        include_sentiment: get(row, "include_sentiment")?,
        identify_speakers: get(row, "identify_speakers")?,
        created_at: get(row, "created_at")?,
        completed_at,
        error_message: get(row, "error_message")?,
        result_document_id: result_document_id.map(DocumentId::from_uuid),
        audio_issues,
        metadata: metadata.unwrap_or(serde_json::Value::Null),
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, JobStoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| JobStoreError::QueryFailed(format!("column {}: {}", column, e)))
}
