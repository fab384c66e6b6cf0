use std::path::Path;

use async_trait::async_trait;

use crate::domain::AudioAnalysis;

/// Measures the raw track. Deterministic for identical input bytes; a
/// failure here is non-fatal and the pipeline falls back to a conservative
/// filter chain.
#[async_trait]
pub trait SignalAnalyzer: Send + Sync {
    async fn analyze(&self, audio_path: &Path) -> Result<AudioAnalysis, AnalysisError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("measurement tool failed: {0}")]
    ToolFailed(String),
    #[error("unreadable output: {0}")]
    UnreadableOutput(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
