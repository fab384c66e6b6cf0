use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Pending,
    Downloading,
    Preprocessing,
    Transcribing,
    Analyzing,
    Saving,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Downloading => "DOWNLOADING",
            JobStatus::Preprocessing => "PREPROCESSING",
            JobStatus::Transcribing => "TRANSCRIBING",
            JobStatus::Analyzing => "ANALYZING",
            JobStatus::Saving => "SAVING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Transitions only move forward through the pipeline; any non-terminal
    /// state may additionally jump to `Failed`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Failed || next.rank() >= self.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Downloading => 1,
            JobStatus::Preprocessing => 2,
            JobStatus::Transcribing => 3,
            JobStatus::Analyzing => 4,
            JobStatus::Saving => 5,
            JobStatus::Completed => 6,
            JobStatus::Failed => 7,
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "DOWNLOADING" => Ok(JobStatus::Downloading),
            "PREPROCESSING" => Ok(JobStatus::Preprocessing),
            "TRANSCRIBING" => Ok(JobStatus::Transcribing),
            "ANALYZING" => Ok(JobStatus::Analyzing),
            "SAVING" => Ok(JobStatus::Saving),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
