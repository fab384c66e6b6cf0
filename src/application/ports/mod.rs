mod audio_filter;
mod job_store;
mod knowledge_sink;
mod language_model;
mod media_acquirer;
mod segment_splitter;
mod signal_analyzer;
mod speech_to_text;

pub use audio_filter::{AudioFilter, FilterError};
pub use job_store::{JobStore, JobStoreError};
pub use knowledge_sink::{KnowledgeSink, KnowledgeSinkError, TranscriptMetadata};
pub use language_model::{LanguageModel, LanguageModelError};
pub use media_acquirer::{AcquiredMedia, AcquisitionError, MediaAcquirer};
pub use segment_splitter::{SegmentBatch, SegmentError, SegmentSplitter};
pub use signal_analyzer::{AnalysisError, SignalAnalyzer};
pub use speech_to_text::{SpeechToText, SpeechToTextError};
