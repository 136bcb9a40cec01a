use crate::phase::PhaseTag;
use crate::verdict::ResultRecord;

/// Opaque server-issued job identifier.
pub type JobId = String;

/// Wall-clock instant in seconds since the Unix epoch.
pub type EpochSeconds = f64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Done,
    Stopped,
    /// A status string this client does not know. Neither active nor terminal.
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "done" => JobStatus::Done,
            "stopped" => JobStatus::Stopped,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Stopped => "stopped",
            JobStatus::Other(raw) => raw,
        }
    }

    /// Queued or running: the form stays locked and stop stays enabled.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Stopped)
    }
}

/// Client-side mirror of one status response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub done: u64,
    pub total: u64,
    pub started_at: Option<EpochSeconds>,
    pub error: Option<String>,
    pub phase: PhaseTag,
    pub phase_count: Option<u64>,
    pub search_done: bool,
    pub search_total: Option<u64>,
    pub seller_kept: Option<u64>,
    pub seller_checked: Option<u64>,
    pub collected_count: Option<u64>,
    pub current_url: Option<String>,
    pub pending_urls: Vec<String>,
    pub results: Vec<ResultRecord>,
}
