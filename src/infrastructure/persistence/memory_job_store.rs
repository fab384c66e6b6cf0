use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{AudioIssue, DocumentId, JobId, JobStatus, OwnerId, TranscriptionJob};

/// Job store backed by a process-local map. Enforces the same transition
/// rules as the Postgres adapter; used by tests and single-process
/// deployments.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, TranscriptionJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F>(&self, id: JobId, apply: F) -> Result<(), JobStoreError>
    where
        F: FnOnce(&mut TranscriptionJob) -> Result<(), JobStoreError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        apply(job)
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &TranscriptionJob) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::ConstraintViolation(format!(
                "job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<TranscriptionJob>, JobStoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<TranscriptionJob>, JobStoreError> {
        let jobs = self.jobs.read().await;
        let mut owned: Vec<TranscriptionJob> = jobs
            .values()
            .filter(|job| job.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_progress(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError> {
        self.mutate(id, |job| {
            if !job.status.can_transition_to(status) {
                return Err(JobStoreError::ConstraintViolation(format!(
                    "job {} cannot move from {} to {}",
                    id, job.status, status
                )));
            }
            job.status = status;
            job.progress = progress.min(100);
            job.progress_message = message.to_string();
            Ok(())
        })
        .await
    }

    async fn set_audio_issues(&self, id: JobId, issues: &[AudioIssue]) -> Result<(), JobStoreError> {
        self.mutate(id, |job| {
            if job.status.is_terminal() {
                return Err(JobStoreError::ConstraintViolation(format!(
                    "job {} is terminal",
                    id
                )));
            }
            job.audio_issues = issues.to_vec();
            Ok(())
        })
        .await
    }

    async fn mark_completed(&self, id: JobId, document_id: DocumentId) -> Result<(), JobStoreError> {
        self.mutate(id, |job| {
            if !job.status.can_transition_to(JobStatus::Completed) {
                return Err(JobStoreError::ConstraintViolation(format!(
                    "job {} is terminal",
                    id
                )));
            }
            job.status = JobStatus::Completed;
            job.progress = 100;
            job.progress_message = "Completed".to_string();
            job.result_document_id = Some(document_id);
            job.completed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), JobStoreError> {
        self.mutate(id, |job| {
            if !job.status.can_transition_to(JobStatus::Failed) {
                return Err(JobStoreError::ConstraintViolation(format!(
                    "job {} is terminal",
                    id
                )));
            }
            job.status = JobStatus::Failed;
            job.error_message = Some(error.to_string());
            job.completed_at = Some(Utc::now());
            Ok(())
        })
        .await
    }
}
