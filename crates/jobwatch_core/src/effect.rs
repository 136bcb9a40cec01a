use crate::{JobId, JobRequest, PollMode, Theme};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateJob { request: JobRequest, mode: PollMode },
    /// Replace any running poll loop with one for `job_id`.
    StartPolling { job_id: JobId, mode: PollMode },
    /// Cancel the poll loop for `job_id`; emitted at most once per session.
    StopPolling { job_id: JobId },
    /// Fire-and-forget stop request to the server.
    StopJob { job_id: JobId },
    ProbeJob { job_id: JobId },
    PersistActiveJob { job_id: Option<JobId> },
    PersistScenario { scenario_id: String },
    PersistTheme { theme: Theme },
    DownloadExport {
        job_id: JobId,
        verdict_query: Option<String>,
        target_dir: String,
    },
    DownloadSearchExport { job_id: JobId, target_dir: String },
}
