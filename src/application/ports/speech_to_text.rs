use async_trait::async_trait;

/// Speech-to-text provider capability, selected once at configuration time.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        audio_data: &[u8],
        language: Option<&str>,
    ) -> Result<String, SpeechToTextError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechToTextError {
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}
