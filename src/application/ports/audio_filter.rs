use std::path::Path;

use async_trait::async_trait;

use crate::domain::FilterChain;

/// Applies a planned filter chain, producing the normalized track handed to
/// transcription.
#[async_trait]
pub trait AudioFilter: Send + Sync {
    async fn apply(
        &self,
        input: &Path,
        chain: &FilterChain,
        output: &Path,
    ) -> Result<(), FilterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("filter tool not installed: {0}")]
    ToolMissing(String),
    #[error("filtering timed out after {0}s")]
    Timeout(u64),
    #[error("filtering failed: {0}")]
    Failed(String),
}
