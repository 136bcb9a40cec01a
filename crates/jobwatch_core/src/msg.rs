use crate::{EpochSeconds, JobId, JobSnapshot, JobStatus, PollMode, RuleSelection, Theme, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Persisted client state loaded at start-up.
    Restored {
        last_job_id: Option<JobId>,
        scenario_id: Option<String>,
        theme: Theme,
    },
    SearchChanged(String),
    SellerChanged(String),
    ManualUrlsChanged(String),
    ScenarioSelected(String),
    OkRulesChanged(RuleSelection),
    ErrorRulesChanged(RuleSelection),
    FreshProfileToggled(bool),
    /// User asked to start a job.
    SubmitClicked(PollMode),
    /// Server accepted the submission.
    JobCreated {
        job_id: JobId,
        total: u64,
        mode: PollMode,
    },
    /// Submission failed in transport or was refused by the server.
    SubmitFailed { message: String },
    /// One successful status poll.
    StatusReceived {
        job_id: JobId,
        snapshot: JobSnapshot,
        observed_at: EpochSeconds,
    },
    /// Transport or decode failure; the next tick retries.
    StatusUnavailable { job_id: JobId, message: String },
    /// Well-formed `ok:false` response; tracking ends.
    StatusRejected { job_id: JobId, message: String },
    StopClicked,
    StopAcknowledged { job_id: JobId },
    StopFailed { job_id: JobId, message: String },
    /// Start-up status probe of the remembered job.
    ProbeCompleted { job_id: JobId, status: JobStatus },
    ProbeFailed { job_id: JobId, message: String },
    ResumeClicked,
    /// Clear the remembered job id.
    ForgetClicked,
    FilterToggled { verdict: Verdict, enabled: bool },
    ThemeSelected(Theme),
    ExportRequested { target_dir: String },
    SearchExportRequested { target_dir: String },
    ExportSaved { path: String },
    ExportFailed { message: String },
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
