use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Retrieves a remote source and extracts a normalized local audio track.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    async fn acquire(
        &self,
        source_url: &str,
        workdir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError>;
}

#[derive(Debug, Clone)]
pub struct AcquiredMedia {
    pub audio_path: PathBuf,
    pub title: Option<String>,
    pub duration_secs: f64,
}

/// Acquisition is the one stage with no fallback: any of these fails the
/// job immediately.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("media tool not installed: {0}")]
    ToolMissing(String),
    #[error("source exceeds size limit: {actual_mb} MB > {limit_mb} MB")]
    SourceTooLarge { actual_mb: u64, limit_mb: u64 },
    #[error("acquisition failed: {0}")]
    Failed(String),
}
