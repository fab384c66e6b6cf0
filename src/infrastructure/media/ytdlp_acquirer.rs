use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{AcquiredMedia, AcquisitionError, MediaAcquirer};

use super::command::{CommandError, run_command};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Retrieves remote sources with yt-dlp, extracting a mono 16 kHz audio
/// track in one pass. The tool's own behavior bounds this stage; there is
/// no additional timeout here, and any failure fails the job outright.
pub struct YtDlpAcquirer {
    max_source_mb: u64,
}

#[derive(Deserialize)]
struct YtDlpMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl YtDlpAcquirer {
    pub fn new(max_source_mb: u64) -> Self {
        Self { max_source_mb }
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    async fn acquire(
        &self,
        source_url: &str,
        workdir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError> {
        let output_template = workdir.join("source.%(ext)s");
        let output_template = output_template.to_string_lossy();
        let max_filesize = format!("{}m", self.max_source_mb);

        let output = run_command(
            "yt-dlp",
            &[
                "--no-playlist",
                "--max-filesize",
                &max_filesize,
                "-x",
                "--audio-format",
                "m4a",
                "--audio-quality",
                "48k",
                "--postprocessor-args",
                "ffmpeg:-ac 1 -ar 16000",
                "--print-json",
                "--no-progress",
                "-o",
                &output_template,
                source_url,
            ],
            None,
        )
        .await
        .map_err(|e| match e {
            CommandError::NotFound(tool) => AcquisitionError::ToolMissing(tool),
            CommandError::Failed { stderr_tail, .. } => AcquisitionError::Failed(stderr_tail),
            other => AcquisitionError::Failed(other.to_string()),
        })?;

        let metadata: YtDlpMetadata = serde_json::from_str(output.stdout.trim())
            .map_err(|e| AcquisitionError::Failed(format!("unreadable tool metadata: {}", e)))?;

        let audio_path = workdir.join("source.m4a");
        let file_meta = tokio::fs::metadata(&audio_path).await.map_err(|_| {
            // yt-dlp exits zero but skips the download when the file tripped
            // its size filter.
            AcquisitionError::Failed("tool produced no audio file".to_string())
        })?;

        let actual_mb = file_meta.len() / BYTES_PER_MB;
        if actual_mb > self.max_source_mb {
            let _ = tokio::fs::remove_file(&audio_path).await;
            return Err(AcquisitionError::SourceTooLarge {
                actual_mb,
                limit_mb: self.max_source_mb,
            });
        }

        let duration_secs = metadata.duration.unwrap_or(0.0);
        tracing::info!(
            bytes = file_meta.len(),
            duration_secs,
            "Audio track extracted from source"
        );

        Ok(AcquiredMedia {
            audio_path,
            title: metadata.title,
            duration_secs,
        })
    }
}
