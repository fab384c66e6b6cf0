use async_trait::async_trait;

use crate::domain::{AudioIssue, DocumentId, MeetingId, TranscriptSummary};

/// Downstream knowledge store. The pipeline hands it a finished transcript
/// and receives back an opaque document id; indexing internals live
/// elsewhere.
#[async_trait]
pub trait KnowledgeSink: Send + Sync {
    async fn store_transcript(
        &self,
        transcript: &str,
        metadata: &TranscriptMetadata,
    ) -> Result<DocumentId, KnowledgeSinkError>;
}

#[derive(Debug, Clone)]
pub struct TranscriptMetadata {
    pub title: String,
    pub source_url: String,
    pub meeting_id: Option<MeetingId>,
    pub duration_secs: f64,
    pub audio_issues: Vec<AudioIssue>,
    pub summary: Option<TranscriptSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeSinkError {
    #[error("store rejected transcript: {0}")]
    Rejected(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
