mod chunk_transcriber;
mod filter_planner;
mod job_orchestrator;
mod transcript_enhancer;

pub use chunk_transcriber::{ChunkTranscriber, TranscribeInput, TranscriberError};
pub use filter_planner::{conservative_chain, plan_filter_chain};
pub use job_orchestrator::{
    JobOrchestrator, OrchestratorError, PipelineDeps, PipelineError, PipelineLimits,
    PipelineMessage, PipelineWorker,
};
pub use transcript_enhancer::{EnhanceOptions, TranscriptEnhancer};
