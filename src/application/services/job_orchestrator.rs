use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tracing::Instrument;

use crate::application::ports::{
    AcquisitionError, AudioFilter, FilterError, JobStore, JobStoreError, KnowledgeSink,
    KnowledgeSinkError, MediaAcquirer, SegmentError, SegmentSplitter, SignalAnalyzer,
    TranscriptMetadata,
};
use crate::application::services::chunk_transcriber::{
    ChunkTranscriber, TranscribeInput, TranscriberError,
};
use crate::application::services::filter_planner::{conservative_chain, plan_filter_chain};
use crate::application::services::transcript_enhancer::{EnhanceOptions, TranscriptEnhancer};
use crate::domain::{
    JobId, JobStatus, NewJobRequest, OwnerId, ParticipantRosterEntry, TranscriptionJob,
};

pub struct PipelineMessage {
    pub job: TranscriptionJob,
    pub roster: Vec<ParticipantRosterEntry>,
}

/// Job creation and query surface. Runs no pipeline work itself: a created
/// job is persisted as `Pending` and handed to the worker over a channel.
pub struct JobOrchestrator {
    job_store: Arc<dyn JobStore>,
    sender: mpsc::Sender<PipelineMessage>,
}

impl JobOrchestrator {
    pub fn new(job_store: Arc<dyn JobStore>, sender: mpsc::Sender<PipelineMessage>) -> Self {
        Self { job_store, sender }
    }

    pub async fn create_job(
        &self,
        owner: OwnerId,
        request: NewJobRequest,
        roster: Vec<ParticipantRosterEntry>,
    ) -> Result<TranscriptionJob, OrchestratorError> {
        let job = TranscriptionJob::new(owner, request);
        self.job_store.create(&job).await?;

        tracing::info!(job_id = %job.id, source_url = %job.source_url, "Transcription job created");

        let message = PipelineMessage {
            job: job.clone(),
            roster,
        };
        if self.sender.send(message).await.is_err() {
            self.job_store
                .mark_failed(job.id, "pipeline worker unavailable")
                .await?;
            return Err(OrchestratorError::QueueClosed);
        }

        Ok(job)
    }

    pub async fn get_job(&self, id: JobId) -> Result<Option<TranscriptionJob>, OrchestratorError> {
        Ok(self.job_store.get_by_id(id).await?)
    }

    pub async fn list_jobs_for_owner(
        &self,
        owner: OwnerId,
    ) -> Result<Vec<TranscriptionJob>, OrchestratorError> {
        Ok(self.job_store.list_for_owner(owner).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("pipeline worker unavailable")]
    QueueClosed,
}

/// Pipeline limits resolved from [`crate::config::Settings`].
#[derive(Debug, Clone)]
pub struct PipelineLimits {
    pub segment_secs: u64,
    pub chunk_threshold_bytes: u64,
}

/// Everything a running pipeline needs, shared across concurrent jobs.
pub struct PipelineDeps {
    pub job_store: Arc<dyn JobStore>,
    pub acquirer: Arc<dyn MediaAcquirer>,
    pub analyzer: Arc<dyn SignalAnalyzer>,
    pub audio_filter: Arc<dyn AudioFilter>,
    pub splitter: Arc<dyn SegmentSplitter>,
    pub transcriber: ChunkTranscriber,
    pub enhancer: TranscriptEnhancer,
    pub knowledge_sink: Arc<dyn KnowledgeSink>,
    pub limits: PipelineLimits,
    /// Media acquisition is serialized more tightly than the pipelines.
    pub acquisition_permits: Arc<Semaphore>,
}

/// Consumes pipeline messages and drives each job through the state
/// machine. Concurrency is bounded by a semaphore; within one job the
/// stages run strictly sequentially.
pub struct PipelineWorker {
    receiver: mpsc::Receiver<PipelineMessage>,
    deps: Arc<PipelineDeps>,
    pipeline_permits: Arc<Semaphore>,
}

impl PipelineWorker {
    pub fn new(
        receiver: mpsc::Receiver<PipelineMessage>,
        deps: Arc<PipelineDeps>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            receiver,
            deps,
            pipeline_permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Transcription pipeline worker started");
        while let Some(message) = self.receiver.recv().await {
            let permit = match Arc::clone(&self.pipeline_permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let deps = Arc::clone(&self.deps);
            let span = tracing::info_span!(
                "transcription_job",
                job_id = %message.job.id,
                title = %message.job.title,
            );
            tokio::spawn(
                async move {
                    let _permit = permit;
                    process_job(deps, message).await;
                }
                .instrument(span),
            );
        }
        tracing::info!("Pipeline worker stopped: channel closed");
    }
}

async fn process_job(deps: Arc<PipelineDeps>, message: PipelineMessage) {
    let job_id = message.job.id;

    match run_pipeline(&deps, &message.job, &message.roster).await {
        Ok(document_id) => {
            if let Err(e) = deps.job_store.mark_completed(job_id, document_id).await {
                tracing::error!(error = %e, "Failed to persist completed state");
            } else {
                tracing::info!(document_id = %document_id, "Transcription job completed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Transcription job failed");
            if let Err(store_err) = deps.job_store.mark_failed(job_id, &e.to_string()).await {
                tracing::error!(error = %store_err, "Failed to persist failed state");
            }
        }
    }
}

async fn run_pipeline(
    deps: &PipelineDeps,
    job: &TranscriptionJob,
    roster: &[ParticipantRosterEntry],
) -> Result<crate::domain::DocumentId, PipelineError> {
    // Scratch space for the whole job; removed on every exit path when the
    // guard drops.
    let workdir = tempfile::tempdir()?;

    transition(deps, job.id, JobStatus::Downloading, 10, "Downloading source media").await?;
    let media = {
        let _permit = deps
            .acquisition_permits
            .acquire()
            .await
            .map_err(|_| PipelineError::WorkerShutdown)?;
        deps.acquirer.acquire(&job.source_url, workdir.path()).await?
    };
    tracing::info!(
        duration_secs = media.duration_secs,
        title = media.title.as_deref().unwrap_or(""),
        "Source media acquired"
    );

    transition(deps, job.id, JobStatus::Preprocessing, 30, "Analyzing and filtering audio").await?;
    let (chain, issues) = match deps.analyzer.analyze(&media.audio_path).await {
        Ok(analysis) => {
            let chain = plan_filter_chain(&analysis);
            tracing::info!(
                mean_volume_db = analysis.mean_volume_db,
                noise_floor_db = analysis.noise_floor_db,
                filters = chain.len(),
                "Signal analysis complete"
            );
            (chain, analysis.issues)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Signal analysis failed, using conservative filter chain");
            (conservative_chain(), Vec::new())
        }
    };
    if !issues.is_empty() {
        deps.job_store.set_audio_issues(job.id, &issues).await?;
    }

    let filtered = workdir.path().join("filtered.m4a");
    deps.audio_filter
        .apply(&media.audio_path, &chain, &filtered)
        .await?;

    transition(deps, job.id, JobStatus::Transcribing, 50, "Transcribing audio").await?;
    let filtered_bytes = tokio::fs::metadata(&filtered).await?.len();
    let needs_split = media.duration_secs > deps.limits.segment_secs as f64
        || filtered_bytes > deps.limits.chunk_threshold_bytes;

    let input = if needs_split {
        let batch = deps
            .splitter
            .split(&filtered, deps.limits.segment_secs, workdir.path())
            .await?;
        tracing::info!(
            segments = batch.segments.len(),
            total_duration_secs = batch.total_duration_secs,
            "Audio split into segments"
        );
        TranscribeInput::Segments(batch.segments)
    } else {
        TranscribeInput::WholeFile(filtered.clone())
    };
    let raw_transcript = deps.transcriber.transcribe(input).await?;

    transition(deps, job.id, JobStatus::Analyzing, 75, "Enhancing transcript").await?;
    let options = EnhanceOptions {
        include_sentiment: job.include_sentiment,
        identify_speakers: job.identify_speakers,
    };
    let enhanced = deps
        .enhancer
        .enhance(&raw_transcript, media.duration_secs, &options, roster)
        .await;

    transition(deps, job.id, JobStatus::Saving, 90, "Saving transcript").await?;
    let metadata = TranscriptMetadata {
        title: media.title.clone().unwrap_or_else(|| job.title.clone()),
        source_url: job.source_url.clone(),
        meeting_id: job.meeting_id,
        duration_secs: media.duration_secs,
        audio_issues: issues,
        summary: Some(enhanced.summary.clone()),
    };
    let document_id = deps
        .knowledge_sink
        .store_transcript(&enhanced.corrected_text, &metadata)
        .await?;

    Ok(document_id)
}

async fn transition(
    deps: &PipelineDeps,
    job_id: JobId,
    status: JobStatus,
    progress: u8,
    message: &str,
) -> Result<(), PipelineError> {
    tracing::debug!(status = %status, progress, "Job status transition");
    deps.job_store
        .update_progress(job_id, status, progress, message)
        .await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("acquisition: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("filtering: {0}")]
    Filter(#[from] FilterError),
    #[error("segmentation: {0}")]
    Split(#[from] SegmentError),
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriberError),
    #[error("knowledge store: {0}")]
    Sink(#[from] KnowledgeSinkError),
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("worker shutting down")]
    WorkerShutdown,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
