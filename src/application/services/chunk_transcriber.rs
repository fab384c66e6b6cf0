use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{SegmentError, SpeechToText, SpeechToTextError};
use crate::domain::AudioSegment;

/// Runs speech-to-text over either the whole normalized file or an ordered
/// list of segments.
///
/// In segmented mode a failed segment becomes an inline gap marker and the
/// remaining segments keep their text and position; only the whole-file
/// path, or every segment failing at once, fails the caller.
pub struct ChunkTranscriber {
    engine: Arc<dyn SpeechToText>,
    chunk_timeout: Duration,
    whole_file_timeout: Duration,
    language: Option<String>,
}

pub enum TranscribeInput {
    WholeFile(PathBuf),
    /// Ordered segment outcomes; an `Err` position is a segment whose
    /// extraction already failed and becomes a gap marker directly.
    Segments(Vec<Result<AudioSegment, SegmentError>>),
}

impl ChunkTranscriber {
    pub fn new(
        engine: Arc<dyn SpeechToText>,
        chunk_timeout: Duration,
        whole_file_timeout: Duration,
        language: Option<String>,
    ) -> Self {
        Self {
            engine,
            chunk_timeout,
            whole_file_timeout,
            language,
        }
    }

    pub async fn transcribe(&self, input: TranscribeInput) -> Result<String, TranscriberError> {
        let transcript = match input {
            TranscribeInput::WholeFile(path) => self.transcribe_whole_file(&path).await?,
            TranscribeInput::Segments(segments) => self.transcribe_segments(segments).await?,
        };

        if transcript.trim().is_empty() {
            return Err(TranscriberError::EmptyTranscript);
        }
        Ok(transcript)
    }

    async fn transcribe_whole_file(&self, path: &std::path::Path) -> Result<String, TranscriberError> {
        let audio = tokio::fs::read(path).await?;

        tracing::debug!(bytes = audio.len(), "Transcribing whole file");

        match tokio::time::timeout(
            self.whole_file_timeout,
            self.engine.transcribe(&audio, self.language.as_deref()),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(TranscriberError::WholeFileFailed(e)),
            Err(_) => Err(TranscriberError::WholeFileTimeout {
                timeout_secs: self.whole_file_timeout.as_secs(),
            }),
        }
    }

    async fn transcribe_segments(
        &self,
        segments: Vec<Result<AudioSegment, SegmentError>>,
    ) -> Result<String, TranscriberError> {
        let total = segments.len();
        let mut fragments: Vec<String> = Vec::with_capacity(total);
        let mut failures = 0usize;

        for (position, outcome) in segments.into_iter().enumerate() {
            let number = position + 1;
            let segment = match outcome {
                Ok(segment) => segment,
                Err(extraction_error) => {
                    tracing::warn!(segment = number, total, error = %extraction_error, "Segment missing, inserting gap marker");
                    failures += 1;
                    fragments.push(format!("[segment {} failed: {}]", number, extraction_error));
                    continue;
                }
            };

            match self.transcribe_one_segment(&segment).await {
                Ok(text) => {
                    tracing::debug!(segment = number, total, chars = text.len(), "Segment transcribed");
                    fragments.push(text);
                }
                Err(reason) => {
                    tracing::warn!(segment = number, total, %reason, "Segment failed, inserting gap marker");
                    failures += 1;
                    fragments.push(format!("[segment {} failed: {}]", number, reason));
                }
            }

            // The backing file is gone after the attempt, either way.
            if let Err(e) = tokio::fs::remove_file(&segment.path).await {
                tracing::warn!(path = %segment.path.display(), error = %e, "Could not remove segment file");
            }
        }

        if failures == total && total > 0 {
            return Err(TranscriberError::AllSegmentsFailed { total });
        }

        Ok(fragments.join(" "))
    }

    async fn transcribe_one_segment(&self, segment: &AudioSegment) -> Result<String, String> {
        let audio = tokio::fs::read(&segment.path)
            .await
            .map_err(|e| format!("unreadable segment file: {}", e))?;

        match tokio::time::timeout(
            self.chunk_timeout,
            self.engine.transcribe(&audio, self.language.as_deref()),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}s", self.chunk_timeout.as_secs())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriberError {
    #[error("whole-file transcription failed: {0}")]
    WholeFileFailed(SpeechToTextError),
    #[error("whole-file transcription timed out after {timeout_secs}s")]
    WholeFileTimeout { timeout_secs: u64 },
    #[error("all {total} segments failed to transcribe")]
    AllSegmentsFailed { total: usize },
    #[error("transcription produced an empty transcript")]
    EmptyTranscript,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
