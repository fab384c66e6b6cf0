use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{SegmentBatch, SegmentError, SegmentSplitter};
use crate::domain::AudioSegment;

use super::command::{CommandError, run_command};

/// Splits the normalized track into fixed-length segments by stream-copying
/// ranges with ffmpeg. Each extraction runs under its own timeout; a
/// timed-out child is killed and only that position is marked failed.
pub struct FfmpegSegmentSplitter {
    extract_timeout: Duration,
}

impl FfmpegSegmentSplitter {
    pub fn new(extract_timeout: Duration) -> Self {
        Self { extract_timeout }
    }

    async fn probe_duration(&self, audio_path: &Path) -> Result<f64, SegmentError> {
        let path = audio_path.to_string_lossy();
        let output = run_command(
            "ffprobe",
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                &path,
            ],
            Some(self.extract_timeout),
        )
        .await
        .map_err(|e| SegmentError::Probe(e.to_string()))?;

        output
            .stdout
            .trim()
            .parse()
            .map_err(|e| SegmentError::Probe(format!("unparsable duration: {}", e)))
    }

    async fn extract_segment(
        &self,
        audio_path: &Path,
        index: usize,
        start_secs: f64,
        length_secs: f64,
        segment_path: &Path,
    ) -> Result<(), SegmentError> {
        let input = audio_path.to_string_lossy();
        let output = segment_path.to_string_lossy();
        let start = format!("{:.3}", start_secs);
        let length = format!("{:.3}", length_secs);

        run_command(
            "ffmpeg",
            &[
                "-hide_banner", "-nostats", "-y", "-ss", &start, "-i", &input, "-t", &length,
                "-c", "copy", &output,
            ],
            Some(self.extract_timeout),
        )
        .await
        .map(|_| ())
        .map_err(|e| match e {
            CommandError::TimedOut { timeout_secs, .. } => SegmentError::Timeout {
                index,
                timeout_secs,
            },
            other => SegmentError::ExtractionFailed {
                index,
                reason: other.to_string(),
            },
        })
    }
}

#[async_trait]
impl SegmentSplitter for FfmpegSegmentSplitter {
    async fn split(
        &self,
        audio_path: &Path,
        segment_secs: u64,
        workdir: &Path,
    ) -> Result<SegmentBatch, SegmentError> {
        let total_duration_secs = self.probe_duration(audio_path).await?;
        let segment_len = segment_secs as f64;
        let count = (total_duration_secs / segment_len).ceil().max(1.0) as usize;

        tracing::info!(
            total_duration_secs,
            segment_secs,
            count,
            "Splitting audio into segments"
        );

        let mut segments = Vec::with_capacity(count);
        for index in 0..count {
            let start_secs = index as f64 * segment_len;
            let end_secs = (start_secs + segment_len).min(total_duration_secs);
            let segment_path = workdir.join(format!("segment_{:03}.m4a", index));

            let outcome = self
                .extract_segment(audio_path, index, start_secs, end_secs - start_secs, &segment_path)
                .await;

            match outcome {
                Ok(()) => {
                    let byte_size = tokio::fs::metadata(&segment_path)
                        .await
                        .map(|m| m.len())
                        .unwrap_or(0);
                    segments.push(Ok(AudioSegment {
                        index,
                        path: segment_path,
                        start_secs,
                        end_secs,
                        byte_size,
                    }));
                }
                Err(e) => {
                    tracing::warn!(segment = index + 1, error = %e, "Segment extraction failed");
                    let _ = tokio::fs::remove_file(&segment_path).await;
                    segments.push(Err(e));
                }
            }
        }

        Ok(SegmentBatch {
            segments,
            total_duration_secs,
        })
    }
}
