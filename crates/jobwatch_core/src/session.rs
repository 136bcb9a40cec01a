use crate::eta::{EtaEstimator, EtaReport};
use crate::form::PollMode;
use crate::job::{EpochSeconds, JobId, JobSnapshot};
use crate::phase::{derive_phase, PhaseSnapshot};

/// Per-job polling state. Replaced wholesale when another job is tracked, so
/// nothing derived from one job leaks into the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerSession {
    job_id: JobId,
    mode: PollMode,
    eta: EtaEstimator,
    last: Option<JobSnapshot>,
    last_observed_at: Option<EpochSeconds>,
    finalized: bool,
    export_suppressed: bool,
}

impl PollerSession {
    pub fn new(job_id: JobId, mode: PollMode) -> Self {
        Self {
            job_id,
            mode,
            eta: EtaEstimator::new(),
            last: None,
            last_observed_at: None,
            finalized: false,
            export_suppressed: false,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn mode(&self) -> PollMode {
        self.mode
    }

    pub fn tracks(&self, job_id: &str) -> bool {
        self.job_id == job_id
    }

    /// Still polling: no terminal or rejected response seen yet.
    pub fn is_live(&self) -> bool {
        !self.finalized
    }

    pub fn observe(&mut self, snapshot: JobSnapshot, observed_at: EpochSeconds) {
        self.eta.observe(snapshot.done, snapshot.started_at, observed_at);
        self.last = Some(snapshot);
        self.last_observed_at = Some(observed_at);
        self.export_suppressed = false;
    }

    /// Marks the session finished. Returns `true` only on the first call.
    pub fn finalize(&mut self) -> bool {
        !std::mem::replace(&mut self.finalized, true)
    }

    pub fn suppress_export(&mut self) {
        self.export_suppressed = true;
    }

    pub fn export_suppressed(&self) -> bool {
        self.export_suppressed
    }

    pub fn last(&self) -> Option<&JobSnapshot> {
        self.last.as_ref()
    }

    pub fn eta(&self) -> &EtaEstimator {
        &self.eta
    }

    pub fn phase(&self) -> Option<PhaseSnapshot> {
        self.last.as_ref().map(|snap| {
            derive_phase(snap.phase, snap.phase_count, snap.search_done, &snap.status)
        })
    }

    /// Forecast as of the most recent observation.
    pub fn eta_report(&self) -> Option<EtaReport> {
        let snap = self.last.as_ref()?;
        let now = self.last_observed_at?;
        Some(self.eta.report(&snap.status, snap.total, snap.done, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_reports_first_transition_only() {
        let mut session = PollerSession::new("job-1".into(), PollMode::Full);
        assert!(session.is_live());
        assert!(session.finalize());
        assert!(!session.finalize());
        assert!(!session.is_live());
    }

    #[test]
    fn observation_clears_export_suppression() {
        let mut session = PollerSession::new("job-1".into(), PollMode::Full);
        session.suppress_export();
        assert!(session.export_suppressed());
        session.observe(JobSnapshot::default(), 1.0);
        assert!(!session.export_suppressed());
        assert!(session.eta_report().is_some());
    }
}
