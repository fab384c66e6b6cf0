mod settings;

pub use settings::{
    ConcurrencySettings, KnowledgeSettings, LlmSettings, LoggingSettings, MediaSettings, Settings,
    TranscriptionSettings,
};
