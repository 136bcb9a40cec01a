//! Jobwatch core: pure job-progress state machine and view-model helpers.
//!
//! Everything here is deterministic. Time arrives as data on messages, and
//! IO is requested through [`Effect`] values that the application executes.
mod effect;
mod eta;
mod form;
mod job;
mod msg;
mod phase;
mod reconcile;
mod session;
mod state;
mod update;
mod verdict;
mod view_model;

pub use effect::Effect;
pub use eta::{
    EtaEstimator, EtaReport, EtaWindow, Remaining, DEFAULT_SECONDS_PER_ITEM, ETA_WINDOW_CAPACITY,
};
pub use form::{
    build_request, parse_urls, JobMeta, JobRequest, PollMode, RuleSelection, Rules, SubmissionForm,
    SubmitError,
};
pub use job::{EpochSeconds, JobId, JobSnapshot, JobStatus};
pub use msg::Msg;
pub use phase::{derive_phase, Phase, PhaseSnapshot, PhaseTag};
pub use reconcile::{collect_urls, reconcile, CollectedUrlSet, Reconciled, ResultRow};
pub use session::PollerSession;
pub use state::{AppState, Theme};
pub use update::update;
pub use verdict::{classify, ResultRecord, Verdict, VerdictFilter, VerdictTally};
pub use view_model::{AppViewModel, ResultBadge, ResultExport, SearchCounters};
