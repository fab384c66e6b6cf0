use chrono::{DateTime, Utc};

use super::{AudioIssue, DocumentId, JobId, JobStatus, MeetingId, OwnerId};

#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub id: JobId,
    pub owner_id: OwnerId,
    pub source_url: String,
    pub title: String,
    pub meeting_id: Option<MeetingId>,
    pub status: JobStatus,
    pub progress: u8,
    pub progress_message: String,
    pub include_sentiment: bool,
    pub identify_speakers: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result_document_id: Option<DocumentId>,
    pub audio_issues: Vec<AudioIssue>,
    pub metadata: serde_json::Value,
}

impl TranscriptionJob {
    pub fn new(owner_id: OwnerId, request: NewJobRequest) -> Self {
        Self {
            id: JobId::new(),
            owner_id,
            source_url: request.source_url,
            title: request.title,
            meeting_id: request.meeting_id,
            status: JobStatus::Pending,
            progress: 0,
            progress_message: "Queued".to_string(),
            include_sentiment: request.include_sentiment,
            identify_speakers: request.identify_speakers,
            created_at: Utc::now(),
            completed_at: None,
            error_message: None,
            result_document_id: None,
            audio_issues: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Caller-supplied input for job creation.
#[derive(Debug, Clone)]
pub struct NewJobRequest {
    pub source_url: String,
    pub title: String,
    pub meeting_id: Option<MeetingId>,
    pub include_sentiment: bool,
    pub identify_speakers: bool,
}
