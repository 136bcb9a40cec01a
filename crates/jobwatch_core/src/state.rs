use crate::reconcile::{reconcile, CollectedUrlSet};
use crate::view_model::{AppViewModel, ResultBadge, ResultExport, SearchCounters};
use crate::{
    JobId, JobSnapshot, JobStatus, PhaseTag, PollMode, PollerSession, SubmissionForm,
    VerdictFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    form: SubmissionForm,
    filter: VerdictFilter,
    collected: CollectedUrlSet,
    session: Option<PollerSession>,
    form_locked: bool,
    stop_enabled: bool,
    submitting: bool,
    resume_visible: bool,
    /// Last full job persisted for resumption.
    remembered_job: Option<JobId>,
    status_line: String,
    theme: Theme,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            status_line: "Ready".to_string(),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let mut view = AppViewModel {
            form_locked: self.form_locked,
            submit_enabled: !self.form_locked && !self.submitting,
            stop_enabled: self.stop_enabled,
            resume_visible: self.resume_offered(),
            status_line: self.status_line.clone(),
            filter: self.filter,
            collected_urls: self.collected.len(),
            theme: self.theme,
            dirty: self.dirty,
            ..AppViewModel::default()
        };

        let Some(session) = &self.session else {
            return view;
        };
        view.job_id = Some(session.job_id().to_string());
        view.mode = Some(session.mode());

        let Some(snap) = session.last() else {
            return view;
        };

        let reconciled = reconcile(snap, &self.filter);
        view.pending = reconciled.pending;
        view.results = reconciled.visible;
        view.tally = reconciled.tally;
        view.current_url = snap.current_url.clone();
        view.progress = Some((snap.done, snap.total));
        view.badge = Some(match snap.status {
            JobStatus::Done => ResultBadge::Done,
            JobStatus::Stopped => ResultBadge::Error,
            _ => ResultBadge::Running,
        });
        view.phase = session.phase();
        view.eta = session.eta_report();
        view.collected_count = Some(snap.collected_count.unwrap_or(snap.total));
        view.counters = search_counters(snap);

        if !session.export_suppressed() {
            let job_id = session.job_id().to_string();
            if snap.status == JobStatus::Done || snap.search_done {
                if !self.filter.is_empty() {
                    view.result_export = Some(ResultExport {
                        job_id: job_id.clone(),
                        verdict_query: self.filter.export_query(),
                    });
                }
                view.search_export = Some(job_id);
            }
        }

        view
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub(crate) fn form_mut(&mut self) -> Option<&mut SubmissionForm> {
        if self.form_locked {
            None
        } else {
            Some(&mut self.form)
        }
    }

    pub fn filter(&self) -> &VerdictFilter {
        &self.filter
    }

    pub(crate) fn filter_mut(&mut self) -> &mut VerdictFilter {
        &mut self.filter
    }

    pub fn collected(&self) -> &CollectedUrlSet {
        &self.collected
    }

    pub(crate) fn collected_mut(&mut self) -> &mut CollectedUrlSet {
        &mut self.collected
    }

    pub fn session(&self) -> Option<&PollerSession> {
        self.session.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut PollerSession> {
        self.session.as_mut()
    }

    /// Session tracking `job_id`, if it is the current one.
    pub(crate) fn session_for(&mut self, job_id: &str) -> Option<&mut PollerSession> {
        self.session.as_mut().filter(|session| session.tracks(job_id))
    }

    /// Starts tracking `job_id`, superseding any previous session.
    pub(crate) fn begin_session(&mut self, job_id: JobId, mode: PollMode) {
        self.session = Some(PollerSession::new(job_id, mode));
        self.form_locked = true;
        self.stop_enabled = true;
        self.resume_visible = false;
    }

    pub fn is_form_locked(&self) -> bool {
        self.form_locked
    }

    pub(crate) fn set_lock(&mut self, active: bool) {
        self.form_locked = active;
        self.stop_enabled = active;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub fn resume_offered(&self) -> bool {
        self.resume_visible && self.remembered_job.is_some()
    }

    pub(crate) fn set_resume_visible(&mut self, visible: bool) {
        self.resume_visible = visible;
    }

    pub fn remembered_job(&self) -> Option<&str> {
        self.remembered_job.as_deref()
    }

    pub(crate) fn set_remembered_job(&mut self, job_id: Option<JobId>) {
        self.remembered_job = job_id;
    }

    pub(crate) fn set_status_line(&mut self, text: impl Into<String>) {
        self.status_line = text.into();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}

fn search_counters(snap: &JobSnapshot) -> Option<SearchCounters> {
    let search_total = snap.search_total.filter(|total| *total > 0)?;
    let kept = snap.seller_kept.unwrap_or(0);
    let seller_visible = kept > 0 || snap.phase == PhaseTag::Seller || snap.search_done;
    let checked = snap
        .seller_checked
        .filter(|checked| *checked > 0)
        .unwrap_or(snap.done);
    Some(SearchCounters {
        search_total,
        seller_kept: seller_visible.then_some(kept),
        checked,
    })
}
