use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};

use plenum::application::ports::JobStore;
use plenum::application::services::{
    ChunkTranscriber, JobOrchestrator, PipelineDeps, PipelineLimits, PipelineWorker,
    TranscriptEnhancer,
};
use plenum::config::Settings;
use plenum::domain::{NewJobRequest, OwnerId};
use plenum::infrastructure::audio::OpenAiWhisperEngine;
use plenum::infrastructure::knowledge::HttpKnowledgeSink;
use plenum::infrastructure::llm::OpenAiChatClient;
use plenum::infrastructure::media::{
    FfmpegAudioFilter, FfmpegSegmentSplitter, FfmpegSignalAnalyzer, YtDlpAcquirer,
};
use plenum::infrastructure::observability::{TracingConfig, init_tracing};
use plenum::infrastructure::persistence::{InMemoryJobStore, PgJobStore, create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(TracingConfig::default());
    let settings = Settings::from_env();

    let mut args = std::env::args().skip(1);
    let source_url = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: plenum <source-url> [title]"))?;
    let title = args.next().unwrap_or_else(|| "Untitled recording".to_string());

    let job_store: Arc<dyn JobStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => Arc::new(PgJobStore::new(create_pool(&url, 5).await?)),
        Err(_) => Arc::new(InMemoryJobStore::new()),
    };

    let whisper = Arc::new(OpenAiWhisperEngine::new(
        settings.transcription.api_key.clone(),
        settings.transcription.base_url.clone(),
        Some(settings.transcription.model.clone()),
        Duration::from_secs(settings.transcription.chunk_timeout_secs),
    ));
    let chat = Arc::new(OpenAiChatClient::new(
        settings.llm.api_key.clone(),
        settings.llm.base_url.clone(),
        settings.llm.chat_model.clone(),
        settings.llm.max_tokens,
        settings.llm.temperature,
        Duration::from_secs(settings.llm.request_timeout_secs),
    ));

    let deps = Arc::new(PipelineDeps {
        job_store: Arc::clone(&job_store),
        acquirer: Arc::new(YtDlpAcquirer::new(settings.media.max_source_mb)),
        analyzer: Arc::new(FfmpegSignalAnalyzer::new(Duration::from_secs(
            settings.media.analysis_timeout_secs,
        ))),
        audio_filter: Arc::new(FfmpegAudioFilter::new(Duration::from_secs(
            settings.media.filter_timeout_secs,
        ))),
        splitter: Arc::new(FfmpegSegmentSplitter::new(Duration::from_secs(
            settings.media.extract_timeout_secs,
        ))),
        transcriber: ChunkTranscriber::new(
            whisper,
            Duration::from_secs(settings.transcription.chunk_timeout_secs),
            Duration::from_secs(settings.transcription.whole_file_timeout_secs),
            settings.transcription.language.clone(),
        ),
        enhancer: TranscriptEnhancer::new(chat),
        knowledge_sink: Arc::new(HttpKnowledgeSink::new(
            settings.knowledge.endpoint.clone(),
            Duration::from_secs(settings.knowledge.request_timeout_secs),
        )),
        limits: PipelineLimits {
            segment_secs: settings.media.segment_secs,
            chunk_threshold_bytes: settings.media.chunk_threshold_mb * 1024 * 1024,
        },
        acquisition_permits: Arc::new(Semaphore::new(settings.concurrency.max_acquisitions)),
    });

    let (sender, receiver) = mpsc::channel(32);
    let worker = PipelineWorker::new(receiver, deps, settings.concurrency.max_pipelines);
    tokio::spawn(worker.run());

    let orchestrator = JobOrchestrator::new(job_store, sender);

    let job = orchestrator
        .create_job(
            OwnerId::new(),
            NewJobRequest {
                source_url,
                title,
                meeting_id: None,
                include_sentiment: true,
                identify_speakers: false,
            },
            Vec::new(),
        )
        .await?;

    loop {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let Some(current) = orchestrator.get_job(job.id).await? else {
            anyhow::bail!("job record disappeared");
        };
        tracing::info!(
            status = %current.status,
            progress = current.progress,
            message = %current.progress_message,
            "Job progress"
        );
        if current.status.is_terminal() {
            match current.error_message {
                Some(error) => anyhow::bail!("job failed: {}", error),
                None => {
                    tracing::info!(
                        document_id = ?current.result_document_id,
                        "Transcript stored"
                    );
                    break;
                }
            }
        }
    }

    Ok(())
}
