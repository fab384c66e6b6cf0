use async_trait::async_trait;

/// Chat-completion provider used by the enhancement pass for correction,
/// classification and speaker resolution.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Plain-text completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LanguageModelError>;

    /// Completion in JSON response mode; the returned string is expected to
    /// be a single JSON object.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String, LanguageModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LanguageModelError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
