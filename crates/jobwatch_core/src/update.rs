use jobwatch_logging::{jobwatch_debug, jobwatch_info, jobwatch_warn};

use crate::form::build_request;
use crate::reconcile::collect_urls;
use crate::{AppState, Effect, JobSnapshot, JobStatus, Msg, PollMode, SubmissionForm};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Restored {
            last_job_id,
            scenario_id,
            theme,
        } => {
            state.set_theme(theme);
            if let Some(scenario_id) = scenario_id {
                edit_form(&mut state, |form| form.scenario_id = Some(scenario_id));
            }
            state.set_remembered_job(last_job_id.clone());
            state.mark_dirty();
            match last_job_id {
                Some(job_id) => vec![Effect::ProbeJob { job_id }],
                None => Vec::new(),
            }
        }
        Msg::SearchChanged(text) => {
            edit_form(&mut state, |form| form.search = text);
            Vec::new()
        }
        Msg::SellerChanged(text) => {
            edit_form(&mut state, |form| form.seller = text);
            Vec::new()
        }
        Msg::ManualUrlsChanged(text) => {
            edit_form(&mut state, |form| form.manual_urls = text);
            Vec::new()
        }
        Msg::OkRulesChanged(selection) => {
            edit_form(&mut state, |form| form.ok_rules = selection);
            Vec::new()
        }
        Msg::ErrorRulesChanged(selection) => {
            edit_form(&mut state, |form| form.error_rules = selection);
            Vec::new()
        }
        Msg::FreshProfileToggled(enabled) => {
            edit_form(&mut state, |form| form.fresh_profile = enabled);
            Vec::new()
        }
        Msg::ScenarioSelected(scenario_id) => {
            let stored = scenario_id.clone();
            if edit_form(&mut state, |form| form.scenario_id = Some(stored)) {
                vec![Effect::PersistScenario { scenario_id }]
            } else {
                Vec::new()
            }
        }
        Msg::SubmitClicked(mode) => submit(&mut state, mode),
        Msg::JobCreated {
            job_id,
            total,
            mode,
        } => {
            jobwatch_info!("Job {} created ({:?}, total {})", job_id, mode, total);
            state.set_submitting(false);
            state.begin_session(job_id.clone(), mode);
            state.set_status_line(format!("{}: job {} ({})", prefix(mode), job_id, total));
            state.mark_dirty();
            let mut effects = Vec::with_capacity(2);
            if mode == PollMode::Full {
                state.set_remembered_job(Some(job_id.clone()));
                effects.push(Effect::PersistActiveJob {
                    job_id: Some(job_id.clone()),
                });
            }
            effects.push(Effect::StartPolling { job_id, mode });
            effects
        }
        Msg::SubmitFailed { message } => {
            jobwatch_warn!("Submission failed: {}", message);
            state.set_submitting(false);
            state.set_status_line(message);
            state.mark_dirty();
            Vec::new()
        }
        Msg::StatusReceived {
            job_id,
            snapshot,
            observed_at,
        } => apply_status(&mut state, &job_id, snapshot, observed_at),
        Msg::StatusUnavailable { job_id, message } => {
            let Some(session) = live_session(&mut state, &job_id) else {
                return (state, Vec::new());
            };
            jobwatch_warn!("Status for {} unavailable: {}", job_id, message);
            session.suppress_export();
            let mode = session.mode();
            state.set_status_line(format!("{}: network error", prefix(mode)));
            state.mark_dirty();
            Vec::new()
        }
        Msg::StatusRejected { job_id, message } => {
            let Some(session) = live_session(&mut state, &job_id) else {
                return (state, Vec::new());
            };
            jobwatch_warn!("Status for {} rejected: {}", job_id, message);
            session.suppress_export();
            session.finalize();
            state.set_lock(false);
            state.set_status_line(message);
            state.mark_dirty();
            vec![Effect::StopPolling { job_id }]
        }
        Msg::StopClicked => match state.session() {
            Some(session) if session.is_live() && state.view().stop_enabled => {
                vec![Effect::StopJob {
                    job_id: session.job_id().to_string(),
                }]
            }
            _ => Vec::new(),
        },
        Msg::StopAcknowledged { job_id } => {
            if state.session_for(&job_id).is_some() {
                state.set_resume_visible(true);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StopFailed { job_id, message } => {
            jobwatch_warn!("Stop request for {} failed: {}", job_id, message);
            if let Some(session) = state.session_for(&job_id) {
                let mode = session.mode();
                state.set_status_line(format!("{}: stop failed", prefix(mode)));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ProbeCompleted { job_id, status } => {
            if state.remembered_job() != Some(job_id.as_str()) || state.session().is_some() {
                return (state, Vec::new());
            }
            if status.is_active() {
                jobwatch_info!("Resuming remembered job {} ({})", job_id, status.as_str());
                state.begin_session(job_id.clone(), PollMode::Full);
                state.mark_dirty();
                vec![Effect::StartPolling {
                    job_id,
                    mode: PollMode::Full,
                }]
            } else {
                if status == JobStatus::Stopped {
                    state.set_resume_visible(true);
                }
                state.set_status_line(format!("Queue: job {job_id} is {}", status.as_str()));
                state.mark_dirty();
                Vec::new()
            }
        }
        Msg::ProbeFailed { job_id, message } => {
            jobwatch_debug!("Probe of remembered job {} failed: {}", job_id, message);
            if state.remembered_job() == Some(job_id.as_str()) && state.session().is_none() {
                state.set_status_line(format!("Queue: job {job_id} unreachable"));
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResumeClicked => {
            let job_id = state.remembered_job().map(ToOwned::to_owned);
            match job_id {
                Some(job_id) if state.resume_offered() && !state.is_form_locked() => {
                    state.begin_session(job_id.clone(), PollMode::Full);
                    state.set_status_line(format!("Queue: resuming {job_id}"));
                    state.mark_dirty();
                    vec![Effect::StartPolling {
                        job_id,
                        mode: PollMode::Full,
                    }]
                }
                _ => Vec::new(),
            }
        }
        Msg::ForgetClicked => {
            state.set_remembered_job(None);
            state.set_resume_visible(false);
            state.mark_dirty();
            vec![Effect::PersistActiveJob { job_id: None }]
        }
        Msg::FilterToggled { verdict, enabled } => {
            if state.filter().allows(verdict) != enabled {
                state.filter_mut().set(verdict, enabled);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ThemeSelected(theme) => {
            state.set_theme(theme);
            state.mark_dirty();
            vec![Effect::PersistTheme { theme }]
        }
        Msg::ExportRequested { target_dir } => match state.view().result_export {
            Some(export) => vec![Effect::DownloadExport {
                job_id: export.job_id,
                verdict_query: export.verdict_query,
                target_dir,
            }],
            None => {
                state.set_status_line("Export: not available");
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::SearchExportRequested { target_dir } => match state.view().search_export {
            Some(job_id) => vec![Effect::DownloadSearchExport { job_id, target_dir }],
            None => {
                state.set_status_line("Search export: not available");
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::ExportSaved { path } => {
            state.set_status_line(format!("Export saved to {path}"));
            state.mark_dirty();
            Vec::new()
        }
        Msg::ExportFailed { message } => {
            state.set_status_line(format!("Export failed: {message}"));
            state.mark_dirty();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, mode: PollMode) -> Vec<Effect> {
    if state.is_form_locked() || state.is_submitting() {
        return Vec::new();
    }
    match build_request(state.form(), mode, state.collected()) {
        Ok(request) => {
            if mode == PollMode::SearchOnly {
                state.collected_mut().clear();
            }
            state.set_submitting(true);
            state.set_status_line(format!("{}: submitting", prefix(mode)));
            state.mark_dirty();
            vec![Effect::CreateJob { request, mode }]
        }
        Err(err) => {
            jobwatch_debug!("Submission rejected locally: {}", err);
            state.set_status_line(format!("{}: {err}", prefix(mode)));
            state.mark_dirty();
            Vec::new()
        }
    }
}

fn apply_status(
    state: &mut AppState,
    job_id: &str,
    snapshot: JobSnapshot,
    observed_at: f64,
) -> Vec<Effect> {
    let Some(mode) = live_session(state, job_id).map(|session| session.mode()) else {
        jobwatch_debug!("Dropping status for {} (superseded or finished)", job_id);
        return Vec::new();
    };

    let added = collect_urls(&snapshot, state.collected_mut());
    if added > 0 {
        jobwatch_debug!("Collected {} new urls for the next batch", added);
    }

    let status = snapshot.status.clone();
    state.set_status_line(status_line(mode, &snapshot));
    if let Some(session) = state.session_mut() {
        session.observe(snapshot, observed_at);
    }
    state.set_lock(status.is_active());
    state.mark_dirty();

    if !status.is_terminal() {
        return Vec::new();
    }

    let first_time = state
        .session_mut()
        .map(|session| session.finalize())
        .unwrap_or(false);
    if !first_time {
        return Vec::new();
    }

    jobwatch_info!("Job {} reached terminal status {}", job_id, status.as_str());
    if !state.collected().is_empty() {
        state.collected_mut().freeze();
    }
    let outcome = if status == JobStatus::Done {
        "complete"
    } else {
        "stopped"
    };
    state.set_status_line(format!("{}: {outcome}", prefix(mode)));
    if status == JobStatus::Stopped {
        state.set_resume_visible(true);
    }
    vec![Effect::StopPolling {
        job_id: job_id.to_string(),
    }]
}

fn live_session<'a>(
    state: &'a mut AppState,
    job_id: &str,
) -> Option<&'a mut crate::PollerSession> {
    state.session_for(job_id).filter(|session| session.is_live())
}

/// Applies a form edit unless the form is locked. Returns whether it applied.
fn edit_form(state: &mut AppState, edit: impl FnOnce(&mut SubmissionForm)) -> bool {
    match state.form_mut() {
        Some(form) => {
            edit(form);
            state.mark_dirty();
            true
        }
        None => false,
    }
}

fn status_line(mode: PollMode, snapshot: &JobSnapshot) -> String {
    match &snapshot.error {
        Some(error) if !error.is_empty() => error.clone(),
        _ => format!(
            "{}: {} ({}/{})",
            prefix(mode),
            snapshot.status.as_str(),
            snapshot.done,
            snapshot.total
        ),
    }
}

fn prefix(mode: PollMode) -> &'static str {
    match mode {
        PollMode::Full => "Queue",
        PollMode::SearchOnly => "Search",
    }
}
