use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jobwatch_app::platform::app::{Flow, WatchLoop};
use jobwatch_app::platform::effects::EffectRunner;
use jobwatch_app::platform::persistence::StateStore;
use jobwatch_app::platform::ui::render::RenderOptions;
use jobwatch_core::{Msg, PollMode, ResultBadge, Theme};
use jobwatch_engine::{
    ApiError, Clock, CreateJobRequest, CreatedJob, EngineHandle, ExportTarget, JobApi,
    JobStatusPayload, JobSummary, ResultPayload,
};
use tempfile::tempdir;

struct FakeServer {
    statuses: Mutex<VecDeque<JobStatusPayload>>,
    created: Mutex<Vec<CreateJobRequest>>,
}

#[async_trait::async_trait]
impl JobApi for FakeServer {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ApiError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(CreatedJob {
            job_id: "j1".to_string(),
            total: 2,
        })
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatusPayload, ApiError> {
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(next.unwrap_or_default())
    }

    async fn stop_job(&self, _job_id: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        Ok(Vec::new())
    }

    async fn export(&self, _target: &ExportTarget) -> Result<Vec<u8>, ApiError> {
        Ok(b"PK-fake-sheet".to_vec())
    }
}

struct StepClock(Mutex<f64>);

impl Clock for StepClock {
    fn now(&self) -> f64 {
        let mut now = self.0.lock().unwrap();
        *now += 30.0;
        *now
    }
}

fn status(state: &str, done: u64, results: &[(&str, &str)]) -> JobStatusPayload {
    JobStatusPayload {
        ok: true,
        status: state.to_string(),
        done,
        total: 2,
        started_at: Some(1_000.0),
        results: results
            .iter()
            .map(|(url, verdict)| ResultPayload {
                url: url.to_string(),
                verdict: Some(verdict.to_string()),
                verdict_reason: None,
            })
            .collect(),
        ..JobStatusPayload::default()
    }
}

fn pump_until<W: std::io::Write>(
    app: &mut WatchLoop<W>,
    mut done: impl FnMut(&WatchLoop<W>) -> bool,
) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(app) {
        assert!(Instant::now() < deadline, "watch loop did not settle");
        app.pump(Duration::from_millis(50));
        app.render_if_dirty().unwrap();
    }
}

#[test]
fn submitted_batch_is_watched_to_completion_and_exported() {
    jobwatch_logging::initialize_for_tests();
    let dir = tempdir().unwrap();
    let server = Arc::new(FakeServer {
        statuses: Mutex::new(
            vec![
                status("queued", 0, &[]),
                status("running", 1, &[("https://shop/p/1", "ok")]),
                status("done", 2, &[("https://shop/p/1", "ok"), ("https://shop/p/2", "nok")]),
            ]
            .into(),
        ),
        created: Mutex::new(Vec::new()),
    });
    let engine = EngineHandle::with_api(
        server.clone(),
        Arc::new(StepClock(Mutex::new(1_000.0))),
        Duration::from_millis(10),
    );
    let store = StateStore::new(dir.path().join("state.ron"));
    let runner = EffectRunner::new(engine, store.clone());
    let export_dir = dir.path().join("exports").display().to_string();
    let mut app = WatchLoop::new(runner, RenderOptions::default(), export_dir, Vec::new());

    app.dispatch(Msg::Restored {
        last_job_id: None,
        scenario_id: None,
        theme: Theme::Dark,
    });
    app.dispatch(Msg::ManualUrlsChanged(
        "https://shop/p/1\nhttps://shop/p/2\n".to_string(),
    ));
    app.dispatch(Msg::SubmitClicked(PollMode::Full));
    assert!(app.state().is_submitting());
    assert!(!app.state().view().submit_enabled);
    assert!(!app.state().is_form_locked());

    pump_until(&mut app, |app| app.state().session().is_some());
    assert!(app.state().is_form_locked());
    assert!(!app.state().is_submitting());

    pump_until(&mut app, |app| app.is_settled());

    let view = app.state().view();
    assert_eq!(view.badge, Some(ResultBadge::Done));
    assert_eq!(view.progress, Some((2, 2)));
    assert_eq!(view.results.len(), 2);
    assert!(!view.form_locked);
    assert_eq!(store.load().last_job_id.as_deref(), Some("j1"));
    assert!(matches!(
        server.created.lock().unwrap().as_slice(),
        [CreateJobRequest::Batch(_)]
    ));

    let output = String::from_utf8(app.out().clone()).unwrap();
    assert!(output.contains("== job j1 (queue) [Done] 2/2"));

    assert_eq!(app.handle_line("export").unwrap(), Flow::Continue);
    pump_until(&mut app, |app| app.is_settled());
    let saved = dir.path().join("exports").join("j1.xlsx");
    assert_eq!(std::fs::read(&saved).unwrap(), b"PK-fake-sheet");

    assert_eq!(app.handle_line("quit").unwrap(), Flow::Quit);
}
