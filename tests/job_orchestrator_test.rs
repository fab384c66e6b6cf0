use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore, mpsc};

use plenum::application::ports::{
    AcquiredMedia, AcquisitionError, AnalysisError, AudioFilter, FilterError, JobStore,
    JobStoreError, KnowledgeSink, KnowledgeSinkError, LanguageModel, LanguageModelError,
    MediaAcquirer, SegmentBatch, SegmentError, SegmentSplitter, SignalAnalyzer, SpeechToText,
    SpeechToTextError, TranscriptMetadata,
};
use plenum::application::services::{
    ChunkTranscriber, JobOrchestrator, PipelineDeps, PipelineLimits, PipelineWorker,
    TranscriptEnhancer,
};
use plenum::domain::{
    AudioAnalysis, AudioIssue, AudioSegment, DocumentId, FilterChain, JobId, JobStatus,
    NewJobRequest, OwnerId, TranscriptionJob,
};
use plenum::infrastructure::persistence::InMemoryJobStore;

// --- stub collaborators -------------------------------------------------

struct StubAcquirer {
    duration_secs: f64,
    fail: bool,
}

#[async_trait]
impl MediaAcquirer for StubAcquirer {
    async fn acquire(
        &self,
        _source_url: &str,
        workdir: &Path,
    ) -> Result<AcquiredMedia, AcquisitionError> {
        if self.fail {
            return Err(AcquisitionError::Failed(
                "unreachable source".to_string(),
            ));
        }
        Ok(AcquiredMedia {
            audio_path: workdir.join("source.m4a"),
            title: Some("Stub recording".to_string()),
            duration_secs: self.duration_secs,
        })
    }
}

struct StubAnalyzer {
    fail: bool,
    issues: Vec<AudioIssue>,
}

#[async_trait]
impl SignalAnalyzer for StubAnalyzer {
    async fn analyze(&self, _audio_path: &Path) -> Result<AudioAnalysis, AnalysisError> {
        if self.fail {
            return Err(AnalysisError::ToolFailed("volumedetect crashed".to_string()));
        }
        Ok(AudioAnalysis {
            mean_volume_db: -22.0,
            max_volume_db: -3.0,
            noise_floor_db: -55.0,
            clipping_ratio: 0.0,
            silence_ratio: 0.1,
            low_band_energy: 0.1,
            sibilant_band_energy: 0.05,
            issues: self.issues.clone(),
        })
    }
}

/// Writes the "filtered" file and remembers the chain it was given.
struct StubFilter {
    output_content: &'static str,
    seen_chain: Mutex<Option<FilterChain>>,
}

impl StubFilter {
    fn new(output_content: &'static str) -> Self {
        Self {
            output_content,
            seen_chain: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AudioFilter for StubFilter {
    async fn apply(
        &self,
        _input: &Path,
        chain: &FilterChain,
        output: &Path,
    ) -> Result<(), FilterError> {
        *self.seen_chain.lock().await = Some(chain.clone());
        tokio::fs::write(output, self.output_content)
            .await
            .map_err(|e| FilterError::Failed(e.to_string()))
    }
}

/// Creates `count` segment files named seg0..segN and reports extraction
/// timeouts for the listed indexes.
struct StubSplitter {
    count: usize,
    fail_extract: Vec<usize>,
    calls: AtomicUsize,
}

impl StubSplitter {
    fn new(count: usize, fail_extract: Vec<usize>) -> Self {
        Self {
            count,
            fail_extract,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SegmentSplitter for StubSplitter {
    async fn split(
        &self,
        _audio_path: &Path,
        segment_secs: u64,
        workdir: &Path,
    ) -> Result<SegmentBatch, SegmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut segments = Vec::new();
        for index in 0..self.count {
            if self.fail_extract.contains(&index) {
                segments.push(Err(SegmentError::Timeout {
                    index,
                    timeout_secs: 60,
                }));
                continue;
            }
            let path = workdir.join(format!("segment_{:03}.m4a", index));
            tokio::fs::write(&path, format!("seg{}", index))
                .await
                .map_err(|e| SegmentError::ExtractionFailed {
                    index,
                    reason: e.to_string(),
                })?;
            segments.push(Ok(AudioSegment {
                index,
                path,
                start_secs: index as f64 * segment_secs as f64,
                end_secs: (index + 1) as f64 * segment_secs as f64,
                byte_size: 4,
            }));
        }
        Ok(SegmentBatch {
            segments,
            total_duration_secs: self.count as f64 * segment_secs as f64,
        })
    }
}

struct StubEngine {
    failing: Vec<&'static str>,
}

#[async_trait]
impl SpeechToText for StubEngine {
    async fn transcribe(
        &self,
        audio_data: &[u8],
        _language: Option<&str>,
    ) -> Result<String, SpeechToTextError> {
        let content = String::from_utf8_lossy(audio_data).into_owned();
        if self.failing.contains(&content.as_str()) {
            return Err(SpeechToTextError::ApiRequestFailed(
                "provider timeout".to_string(),
            ));
        }
        Ok(format!("transcript of {}", content))
    }
}

/// Model whose calls always fail, exercising every enhancement fallback.
struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::ApiRequestFailed("offline".to_string()))
    }

    async fn complete_json(&self, _system: &str, _user: &str) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::ApiRequestFailed("offline".to_string()))
    }
}

/// Model that corrects fine but returns unparsable classification output.
struct GarbageClassifier;

#[async_trait]
impl LanguageModel for GarbageClassifier {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, LanguageModelError> {
        Ok(user.to_string())
    }

    async fn complete_json(&self, _system: &str, _user: &str) -> Result<String, LanguageModelError> {
        Ok("certainly! here is your JSON: {oops".to_string())
    }
}

#[derive(Default)]
struct CapturingSink {
    captured: Mutex<Option<(String, TranscriptMetadata)>>,
}

#[async_trait]
impl KnowledgeSink for CapturingSink {
    async fn store_transcript(
        &self,
        transcript: &str,
        metadata: &TranscriptMetadata,
    ) -> Result<DocumentId, KnowledgeSinkError> {
        *self.captured.lock().await = Some((transcript.to_string(), metadata.clone()));
        Ok(DocumentId::new())
    }
}

/// Store wrapper recording every persisted transition.
struct RecordingStore {
    inner: InMemoryJobStore,
    statuses: Mutex<Vec<JobStatus>>,
    progresses: Mutex<Vec<u8>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            statuses: Mutex::new(Vec::new()),
            progresses: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, job: &TranscriptionJob) -> Result<(), JobStoreError> {
        self.inner.create(job).await
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<TranscriptionJob>, JobStoreError> {
        self.inner.get_by_id(id).await
    }

    async fn list_for_owner(&self, owner: OwnerId) -> Result<Vec<TranscriptionJob>, JobStoreError> {
        self.inner.list_for_owner(owner).await
    }

    // Transitions are recorded before delegation so a poller that already
    // observes the new state always finds it in the log.
    async fn update_progress(
        &self,
        id: JobId,
        status: JobStatus,
        progress: u8,
        message: &str,
    ) -> Result<(), JobStoreError> {
        self.statuses.lock().await.push(status);
        self.progresses.lock().await.push(progress);
        self.inner.update_progress(id, status, progress, message).await
    }

    async fn set_audio_issues(&self, id: JobId, issues: &[AudioIssue]) -> Result<(), JobStoreError> {
        self.inner.set_audio_issues(id, issues).await
    }

    async fn mark_completed(&self, id: JobId, document_id: DocumentId) -> Result<(), JobStoreError> {
        self.statuses.lock().await.push(JobStatus::Completed);
        self.progresses.lock().await.push(100);
        self.inner.mark_completed(id, document_id).await
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), JobStoreError> {
        self.statuses.lock().await.push(JobStatus::Failed);
        self.inner.mark_failed(id, error).await
    }
}

// --- harness ------------------------------------------------------------

struct Harness {
    orchestrator: JobOrchestrator,
    store: Arc<RecordingStore>,
    sink: Arc<CapturingSink>,
}

fn spawn_pipeline(
    acquirer: Arc<dyn MediaAcquirer>,
    analyzer: Arc<dyn SignalAnalyzer>,
    audio_filter: Arc<StubFilter>,
    splitter: Arc<StubSplitter>,
    engine: Arc<dyn SpeechToText>,
    model: Arc<dyn LanguageModel>,
) -> Harness {
    let store = Arc::new(RecordingStore::new());
    let sink = Arc::new(CapturingSink::default());

    let deps = Arc::new(PipelineDeps {
        job_store: Arc::clone(&store) as Arc<dyn JobStore>,
        acquirer,
        analyzer,
        audio_filter: Arc::clone(&audio_filter) as Arc<dyn AudioFilter>,
        splitter: Arc::clone(&splitter) as Arc<dyn SegmentSplitter>,
        transcriber: ChunkTranscriber::new(
            engine,
            Duration::from_secs(5),
            Duration::from_secs(10),
            None,
        ),
        enhancer: TranscriptEnhancer::new(model),
        knowledge_sink: Arc::clone(&sink) as Arc<dyn KnowledgeSink>,
        limits: PipelineLimits {
            segment_secs: 600,
            chunk_threshold_bytes: 25 * 1024 * 1024,
        },
        acquisition_permits: Arc::new(Semaphore::new(1)),
    });

    let (sender, receiver) = mpsc::channel(8);
    tokio::spawn(PipelineWorker::new(receiver, deps, 2).run());

    Harness {
        orchestrator: JobOrchestrator::new(Arc::clone(&store) as Arc<dyn JobStore>, sender),
        store,
        sink,
    }
}

fn request() -> NewJobRequest {
    NewJobRequest {
        source_url: "https://example.org/meeting.mp4".to_string(),
        title: "City council session".to_string(),
        meeting_id: None,
        include_sentiment: true,
        identify_speakers: false,
    }
}

async fn wait_for_terminal(store: &RecordingStore, id: JobId) -> TranscriptionJob {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(job) = store.get_by_id(id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job never reached a terminal state"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// --- scenarios ----------------------------------------------------------

#[tokio::test]
async fn given_short_clean_recording_when_running_then_job_walks_every_stage_to_completed() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 180.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("whole")),
        Arc::new(StubSplitter::new(0, vec![])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let finished = wait_for_terminal(&harness.store, job.id).await;
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.progress, 100);
    assert!(finished.result_document_id.is_some());
    assert!(finished.completed_at.is_some());

    let statuses = harness.store.statuses.lock().await.clone();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Downloading,
            JobStatus::Preprocessing,
            JobStatus::Transcribing,
            JobStatus::Analyzing,
            JobStatus::Saving,
            JobStatus::Completed,
        ]
    );

    let (transcript, _) = harness.sink.captured.lock().await.clone().unwrap();
    assert_eq!(transcript, "transcript of whole");
    assert!(!transcript.contains("[segment"));
}

#[tokio::test]
async fn given_long_recording_with_one_bad_chunk_when_running_then_job_completes_with_gap_marker() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 2400.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![AudioIssue::NoisyBackground],
        }),
        Arc::new(StubFilter::new("filtered")),
        Arc::new(StubSplitter::new(5, vec![])),
        Arc::new(StubEngine {
            failing: vec!["seg2"],
        }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.audio_issues, vec![AudioIssue::NoisyBackground]);

    let (transcript, metadata) = harness.sink.captured.lock().await.clone().unwrap();
    let expected_order = [
        "transcript of seg0",
        "transcript of seg1",
        "[segment 3 failed:",
        "transcript of seg3",
        "transcript of seg4",
    ];
    let mut cursor = 0;
    for needle in expected_order {
        let found = transcript[cursor..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{}' missing or out of order", needle));
        cursor += found + needle.len();
    }
    assert_eq!(metadata.audio_issues, vec![AudioIssue::NoisyBackground]);
}

#[tokio::test]
async fn given_unreachable_source_when_running_then_job_fails_during_download() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 0.0,
            fail: true,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("whole")),
        Arc::new(StubSplitter::new(0, vec![])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Failed);
    assert!(finished.error_message.unwrap().contains("unreachable source"));

    let statuses = harness.store.statuses.lock().await.clone();
    assert_eq!(statuses, vec![JobStatus::Downloading, JobStatus::Failed]);
    assert!(harness.sink.captured.lock().await.is_none());
}

#[tokio::test]
async fn given_unparsable_classification_when_running_then_job_completes_with_single_speaker() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 180.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("whole")),
        Arc::new(StubSplitter::new(0, vec![])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(GarbageClassifier),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Completed);
    let (_, metadata) = harness.sink.captured.lock().await.clone().unwrap();
    let summary = metadata.summary.unwrap();
    assert_eq!(summary.speaker_count, 1);
    assert!((summary.average_tension - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn given_failed_segment_extraction_when_running_then_marker_appears_at_that_position() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 1800.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("filtered")),
        Arc::new(StubSplitter::new(3, vec![1])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Completed);
    let (transcript, _) = harness.sink.captured.lock().await.clone().unwrap();
    assert!(transcript.contains("transcript of seg0"));
    assert!(transcript.contains("[segment 2 failed:"));
    assert!(transcript.contains("transcript of seg2"));
}

#[tokio::test]
async fn given_recording_at_threshold_when_running_then_splitter_is_bypassed() {
    let splitter = Arc::new(StubSplitter::new(3, vec![]));
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 600.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("whole")),
        Arc::clone(&splitter),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(splitter.calls.load(Ordering::SeqCst), 0);

    let (transcript, _) = harness.sink.captured.lock().await.clone().unwrap();
    assert_eq!(transcript, "transcript of whole");
}

#[tokio::test]
async fn given_analysis_failure_when_running_then_conservative_chain_is_applied_and_job_completes() {
    let audio_filter = Arc::new(StubFilter::new("whole"));
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 120.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: true,
            issues: vec![],
        }),
        Arc::clone(&audio_filter),
        Arc::new(StubSplitter::new(0, vec![])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    let finished = wait_for_terminal(&harness.store, job.id).await;

    assert_eq!(finished.status, JobStatus::Completed);
    assert!(finished.audio_issues.is_empty());

    let chain = audio_filter.seen_chain.lock().await.clone().unwrap();
    assert_eq!(chain, plenum::application::services::conservative_chain());
}

#[tokio::test]
async fn given_any_run_when_observing_progress_then_persisted_values_never_decrease() {
    let harness = spawn_pipeline(
        Arc::new(StubAcquirer {
            duration_secs: 2400.0,
            fail: false,
        }),
        Arc::new(StubAnalyzer {
            fail: false,
            issues: vec![],
        }),
        Arc::new(StubFilter::new("filtered")),
        Arc::new(StubSplitter::new(4, vec![])),
        Arc::new(StubEngine { failing: vec![] }),
        Arc::new(OfflineModel),
    );

    let job = harness
        .orchestrator
        .create_job(OwnerId::new(), request(), Vec::new())
        .await
        .unwrap();
    wait_for_terminal(&harness.store, job.id).await;

    let progresses = harness.store.progresses.lock().await.clone();
    assert!(!progresses.is_empty());
    assert!(
        progresses.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress went backwards: {:?}",
        progresses
    );
}
