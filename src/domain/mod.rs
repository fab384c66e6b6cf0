mod audio_analysis;
mod audio_segment;
mod filter_chain;
mod ids;
mod job;
mod job_status;
mod roster;
mod transcript;

pub use audio_analysis::{AudioAnalysis, AudioIssue};
pub use audio_segment::AudioSegment;
pub use filter_chain::{FilterChain, FilterOp};
pub use ids::{DocumentId, JobId, MeetingId, OwnerId};
pub use job::{NewJobRequest, TranscriptionJob};
pub use job_status::JobStatus;
pub use roster::ParticipantRosterEntry;
pub use transcript::{EnhancedTranscript, Emotion, Sentiment, TranscriptSegment, TranscriptSummary};
