use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::{KnowledgeSink, KnowledgeSinkError, TranscriptMetadata};
use crate::domain::DocumentId;

/// Hands the finished transcript to the knowledge-store service and returns
/// the document id it minted. Embedding and indexing happen on the other
/// side of this call.
pub struct HttpKnowledgeSink {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct StoreResponse {
    document_id: Uuid,
}

impl HttpKnowledgeSink {
    pub fn new(endpoint: String, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }
}

#[async_trait]
impl KnowledgeSink for HttpKnowledgeSink {
    async fn store_transcript(
        &self,
        transcript: &str,
        metadata: &TranscriptMetadata,
    ) -> Result<DocumentId, KnowledgeSinkError> {
        let issues: Vec<String> = metadata.audio_issues.iter().map(|i| i.to_string()).collect();
        let payload = serde_json::json!({
            "text": transcript,
            "title": metadata.title,
            "source_url": metadata.source_url,
            "meeting_id": metadata.meeting_id.map(|m| m.as_uuid()),
            "duration_secs": metadata.duration_secs,
            "audio_issues": issues,
            "summary": metadata.summary.as_ref().map(|s| serde_json::json!({
                "average_tension": s.average_tension,
                "dominant_sentiment": s.dominant_sentiment.as_str(),
                "overall_credibility": s.overall_credibility,
                "speaker_count": s.speaker_count,
            })),
        });

        tracing::debug!(chars = transcript.len(), "Storing transcript in knowledge store");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| KnowledgeSinkError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(KnowledgeSinkError::Rejected(format!(
                "status {}: {}",
                status, body
            )));
        }

        let stored: StoreResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeSinkError::ApiRequestFailed(format!("parse response: {}", e)))?;

        Ok(DocumentId::from_uuid(stored.document_id))
    }
}
