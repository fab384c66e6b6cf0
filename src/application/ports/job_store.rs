use async_trait::async_trait;

use crate::domain::{AudioIssue, DocumentId, JobId, JobStatus, OwnerId, TranscriptionJob};

/// Durable record storage for transcription jobs.
///
/// Only the worker that owns a job writes to it; other callers read the
/// last persisted transition. Implementations must reject writes against a
/// terminal job with `ConstraintViolation`.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &TranscriptionJob) -> Result<(), JobStoreError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<TranscriptionJob>, JobStoreError>;

    async fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<TranscriptionJob>, JobStoreError>;

    async fn update_progress(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError>;

    async fn set_audio_issues(&self, id: JobId, issues: &[AudioIssue]) -> Result<(), JobStoreError>;

    async fn mark_completed(&self, id: JobId, document_id: DocumentId) -> Result<(), JobStoreError>;

    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), JobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
