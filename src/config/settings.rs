use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub media: MediaSettings,
    pub transcription: TranscriptionSettings,
    pub llm: LlmSettings,
    pub knowledge: KnowledgeSettings,
    pub concurrency: ConcurrencySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Refuse sources whose extracted audio exceeds this.
    pub max_source_mb: u64,
    /// Fixed segment length used when splitting long tracks.
    pub segment_secs: u64,
    /// Files above this go through the segmented transcription path.
    pub chunk_threshold_mb: u64,
    pub analysis_timeout_secs: u64,
    pub filter_timeout_secs: u64,
    pub extract_timeout_secs: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_source_mb: 500,
            segment_secs: 600,
            chunk_threshold_mb: 25,
            analysis_timeout_secs: 120,
            filter_timeout_secs: 120,
            extract_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub language: Option<String>,
    pub chunk_timeout_secs: u64,
    pub whole_file_timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            model: "whisper-1".to_string(),
            language: None,
            chunk_timeout_secs: 300,
            whole_file_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            chat_model: "gpt-4o-mini".to_string(),
            max_tokens: 8192,
            temperature: 0.2,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8200/api/documents".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConcurrencySettings {
    /// Concurrent pipelines; keeps transcription and classification calls
    /// inside downstream rate limits.
    pub max_pipelines: usize,
    /// Media acquisitions run under a separate, tighter bound.
    pub max_acquisitions: usize,
}

impl Default for ConcurrencySettings {
    fn default() -> Self {
        Self {
            max_pipelines: 2,
            max_acquisitions: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}

impl Settings {
    /// Defaults overridden by `PLENUM_*` environment variables for the
    /// handful of values that differ between deployments.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            settings.transcription.api_key = key.clone();
            settings.llm.api_key = key;
        }
        if let Some(mb) = env_parse("PLENUM_MAX_SOURCE_MB") {
            settings.media.max_source_mb = mb;
        }
        if let Some(secs) = env_parse("PLENUM_SEGMENT_SECS") {
            settings.media.segment_secs = secs;
        }
        if let Ok(model) = std::env::var("PLENUM_CHAT_MODEL") {
            settings.llm.chat_model = model;
        }
        if let Ok(endpoint) = std::env::var("PLENUM_KNOWLEDGE_ENDPOINT") {
            settings.knowledge.endpoint = endpoint;
        }
        if let Some(n) = env_parse("PLENUM_MAX_PIPELINES") {
            settings.concurrency.max_pipelines = n;
        }

        settings
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
