use crate::{
    EtaReport, JobId, PhaseSnapshot, PollMode, ResultRow, Theme, VerdictFilter, VerdictTally,
};

/// Result badge shown next to the progress counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBadge {
    Running,
    Done,
    /// The job was stopped before finishing.
    Error,
}

/// Search and seller-pass counters; absent until the server reports a
/// positive search total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchCounters {
    pub search_total: u64,
    /// Shown once the seller pass is visible (kept > 0, seller phase, or
    /// search done).
    pub seller_kept: Option<u64>,
    pub checked: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultExport {
    pub job_id: JobId,
    /// Comma-joined verdict list; `None` means every verdict.
    pub verdict_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub form_locked: bool,
    pub submit_enabled: bool,
    pub stop_enabled: bool,
    pub resume_visible: bool,
    pub status_line: String,
    pub job_id: Option<JobId>,
    pub mode: Option<PollMode>,
    pub badge: Option<ResultBadge>,
    pub progress: Option<(u64, u64)>,
    pub phase: Option<PhaseSnapshot>,
    pub eta: Option<EtaReport>,
    pub collected_count: Option<u64>,
    pub counters: Option<SearchCounters>,
    pub current_url: Option<String>,
    pub pending: Vec<String>,
    pub results: Vec<ResultRow>,
    pub tally: VerdictTally,
    pub filter: VerdictFilter,
    pub result_export: Option<ResultExport>,
    pub search_export: Option<JobId>,
    /// URLs saved for the next full batch.
    pub collected_urls: usize,
    pub theme: Theme,
    pub dirty: bool,
}
