use std::path::PathBuf;
use std::time::Duration;

use jobwatch_core::{
    Effect, JobMeta, JobRequest, JobSnapshot, JobStatus, Msg, PhaseTag, PollMode, ResultRecord,
    Rules,
};
use jobwatch_engine::{
    AutoBatchBody, BatchBody, CreateJobRequest, EngineEvent, EngineHandle, ExportTarget, JobKind,
    JobStatusPayload, JobSummary, MetaPayload, RulesPayload, SearchOnlyBody, SearchSettings,
};
use jobwatch_logging::{jobwatch_debug, jobwatch_info, jobwatch_warn};

use super::persistence::StateStore;

/// Executes core effects against the engine and the state file, and turns
/// engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    store: StateStore,
    /// One-shot requests (create, probe, stop, export) awaiting a reply.
    in_flight: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: StateStore) -> Self {
        Self {
            engine,
            store,
            in_flight: 0,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CreateJob { request, mode } => {
                    jobwatch_info!("CreateJob mode={:?}", mode);
                    self.in_flight += 1;
                    self.engine.create_job(to_engine_request(request));
                }
                Effect::StartPolling { job_id, mode } => {
                    jobwatch_debug!("StartPolling job_id={} mode={:?}", job_id, mode);
                    self.engine.start_polling(job_id);
                }
                Effect::StopPolling { job_id } => {
                    self.engine.stop_polling(job_id);
                }
                Effect::StopJob { job_id } => {
                    jobwatch_info!("StopJob job_id={}", job_id);
                    self.in_flight += 1;
                    self.engine.stop_job(job_id);
                }
                Effect::ProbeJob { job_id } => {
                    self.in_flight += 1;
                    self.engine.probe(job_id);
                }
                Effect::PersistActiveJob { job_id } => {
                    self.store.remember_job(job_id);
                }
                Effect::PersistScenario { scenario_id } => {
                    self.store.remember_scenario(scenario_id);
                }
                Effect::PersistTheme { theme } => {
                    self.store.remember_theme(theme);
                }
                Effect::DownloadExport {
                    job_id,
                    verdict_query,
                    target_dir,
                } => {
                    self.in_flight += 1;
                    self.engine.export(
                        ExportTarget::Results {
                            job_id,
                            verdict_query,
                        },
                        PathBuf::from(target_dir),
                    );
                }
                Effect::DownloadSearchExport { job_id, target_dir } => {
                    self.in_flight += 1;
                    self.engine
                        .export(ExportTarget::Search { job_id }, PathBuf::from(target_dir));
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event and maps it.
    pub fn next_msg(&mut self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        if !matches!(event, EngineEvent::Status { .. }) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        event_to_msg(event)
    }

    /// Blocks for a job listing; other events are discarded.
    pub fn list_jobs(&mut self, timeout: Duration) -> Option<Result<Vec<JobSummary>, String>> {
        self.engine.list_jobs();
        loop {
            match self.engine.recv_timeout(timeout)? {
                EngineEvent::JobsListed { result } => {
                    return Some(result.map_err(|err| err.to_string()));
                }
                other => jobwatch_debug!("Ignoring {:?} while listing jobs", other),
            }
        }
    }
}

pub fn mode_for(kind: JobKind) -> PollMode {
    match kind {
        JobKind::SearchOnly => PollMode::SearchOnly,
        JobKind::Batch | JobKind::AutoBatch => PollMode::Full,
    }
}

/// Maps an engine event to the message the core expects. Job listings are
/// not part of the watch loop and map to `None`.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::JobCreated { kind, result } => match result {
            Ok(created) => Msg::JobCreated {
                job_id: created.job_id,
                total: created.total,
                mode: mode_for(kind),
            },
            Err(err) => {
                jobwatch_warn!("Job creation failed: {}", err);
                Msg::SubmitFailed {
                    message: err.message,
                }
            }
        },
        EngineEvent::Status {
            job_id,
            observed_at,
            result,
        } => match result {
            Ok(payload) => Msg::StatusReceived {
                job_id,
                snapshot: to_snapshot(payload),
                observed_at,
            },
            Err(err) if err.is_transient() => Msg::StatusUnavailable {
                job_id,
                message: err.to_string(),
            },
            Err(err) => Msg::StatusRejected {
                job_id,
                message: err.message,
            },
        },
        EngineEvent::StopSent { job_id, result } => match result {
            Ok(()) => Msg::StopAcknowledged { job_id },
            Err(err) => Msg::StopFailed {
                job_id,
                message: err.to_string(),
            },
        },
        EngineEvent::Probed { job_id, result } => match result {
            Ok(payload) => Msg::ProbeCompleted {
                job_id,
                status: JobStatus::parse(&payload.status),
            },
            Err(err) => Msg::ProbeFailed {
                job_id,
                message: err.to_string(),
            },
        },
        EngineEvent::ExportSaved { result, .. } => match result {
            Ok(path) => Msg::ExportSaved {
                path: path.display().to_string(),
            },
            Err(err) => Msg::ExportFailed {
                message: err.to_string(),
            },
        },
        EngineEvent::JobsListed { .. } => return None,
    };
    Some(msg)
}

pub fn to_snapshot(payload: JobStatusPayload) -> JobSnapshot {
    JobSnapshot {
        status: JobStatus::parse(&payload.status),
        done: payload.done,
        total: payload.total,
        started_at: payload.started_at,
        error: payload.error,
        phase: PhaseTag::parse(payload.phase.as_deref()),
        phase_count: payload.phase_count,
        search_done: payload.search_done,
        search_total: payload.search_total,
        seller_kept: payload.seller_kept,
        seller_checked: payload.seller_checked,
        collected_count: payload.collected_count,
        current_url: payload.current_url,
        pending_urls: payload.pending_urls,
        results: payload
            .results
            .into_iter()
            .map(|result| ResultRecord {
                url: result.url,
                verdict: result.verdict,
                verdict_reason: result.verdict_reason,
            })
            .collect(),
    }
}

pub fn to_engine_request(request: JobRequest) -> CreateJobRequest {
    match request {
        JobRequest::Urls { urls, rules, meta } => CreateJobRequest::Batch(BatchBody {
            urls: urls.join("\n"),
            rules: to_rules(rules),
            meta: to_meta(meta),
        }),
        JobRequest::Search {
            search,
            seller,
            fresh_profile,
            rules,
            meta,
        } => CreateJobRequest::AutoBatch(AutoBatchBody {
            search,
            seller,
            search_settings: SearchSettings { fresh_profile },
            rules: to_rules(rules),
            meta: to_meta(meta),
        }),
        JobRequest::SearchOnly {
            search,
            seller,
            fresh_profile,
            meta,
        } => CreateJobRequest::SearchOnly(SearchOnlyBody {
            search,
            seller,
            search_settings: SearchSettings { fresh_profile },
            meta: to_meta(meta),
        }),
    }
}

fn to_rules(rules: Rules) -> RulesPayload {
    RulesPayload {
        ok_conditions: rules.ok_conditions,
        error_conditions: rules.error_conditions,
    }
}

fn to_meta(meta: JobMeta) -> MetaPayload {
    MetaPayload {
        scenario_id: meta.scenario_id,
        search: meta.search,
        seller: meta.seller,
    }
}
