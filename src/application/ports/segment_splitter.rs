use std::path::Path;

use async_trait::async_trait;

use crate::domain::AudioSegment;

/// Cuts the normalized track into fixed-length, non-overlapping segments,
/// each extraction running under its own timeout.
///
/// A single extraction failure surfaces as an `Err` at that position so the
/// transcriber can substitute a gap marker; only failing to probe the track
/// at all fails the whole call. The split-or-bypass decision belongs to the
/// caller.
#[async_trait]
pub trait SegmentSplitter: Send + Sync {
    async fn split(
        &self,
        audio_path: &Path,
        segment_secs: u64,
        workdir: &Path,
    ) -> Result<SegmentBatch, SegmentError>;
}

#[derive(Debug)]
pub struct SegmentBatch {
    /// Ordered by segment index; `Err` marks a segment whose extraction
    /// failed or timed out.
    pub segments: Vec<Result<AudioSegment, SegmentError>>,
    pub total_duration_secs: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("segment {index} extraction timed out after {timeout_secs}s")]
    Timeout { index: usize, timeout_secs: u64 },
    #[error("segment {index} extraction failed: {reason}")]
    ExtractionFailed { index: usize, reason: String },
    #[error("could not probe duration: {0}")]
    Probe(String),
}
