use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use jobwatch_logging::{jobwatch_error, jobwatch_info, jobwatch_warn};

use crate::persist::AtomicFileWriter;
use crate::poller::{ChannelEventSink, EventSink, Poller};
use crate::{
    ApiError, ApiFailure, Clock, CreateJobRequest, EngineConfig, EngineEvent, ExportTarget,
    HttpJobApi, JobApi, JobId, SystemClock,
};

enum EngineCommand {
    CreateJob(CreateJobRequest),
    StartPolling { job_id: JobId },
    StopPolling { job_id: JobId },
    StopJob { job_id: JobId },
    Probe { job_id: JobId },
    ListJobs,
    Export { target: ExportTarget, dir: PathBuf },
}

/// Owns the engine thread and its tokio runtime. Dropping the handle ends
/// the thread and cancels any poll loop.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, ApiError> {
        let api = HttpJobApi::new(&config)?;
        Ok(Self::with_api(Arc::new(api), Arc::new(SystemClock), config.poll_interval))
    }

    pub fn with_api(api: Arc<dyn JobApi>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    jobwatch_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let _guard = runtime.enter();
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let poller = Poller::new(api.clone(), clock, poll_interval);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { job_id } => {
                        poller.start(job_id, sink.clone());
                    }
                    EngineCommand::StopPolling { job_id } => {
                        poller.stop(&job_id);
                    }
                    command => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), command, sink.as_ref()).await;
                        });
                    }
                }
            }
            poller.stop_all();
        });

        Self { cmd_tx, event_rx }
    }

    pub fn create_job(&self, request: CreateJobRequest) {
        self.send(EngineCommand::CreateJob(request));
    }

    pub fn start_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StartPolling {
            job_id: job_id.into(),
        });
    }

    pub fn stop_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StopPolling {
            job_id: job_id.into(),
        });
    }

    pub fn stop_job(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StopJob {
            job_id: job_id.into(),
        });
    }

    /// Single status fetch outside the poll loop.
    pub fn probe(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::Probe {
            job_id: job_id.into(),
        });
    }

    pub fn list_jobs(&self) {
        self.send(EngineCommand::ListJobs);
    }

    pub fn export(&self, target: ExportTarget, dir: impl Into<PathBuf>) {
        self.send(EngineCommand::Export {
            target,
            dir: dir.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            jobwatch_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(api: &dyn JobApi, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::CreateJob(request) => {
            let kind = request.kind();
            let result = api.create_job(&request).await;
            if let Ok(created) = &result {
                jobwatch_info!("Created {:?} job {}", kind, created.job_id);
            }
            sink.emit(EngineEvent::JobCreated { kind, result });
        }
        EngineCommand::StopJob { job_id } => {
            let result = api.stop_job(&job_id).await;
            sink.emit(EngineEvent::StopSent { job_id, result });
        }
        EngineCommand::Probe { job_id } => {
            let result = api.job_status(&job_id).await;
            sink.emit(EngineEvent::Probed { job_id, result });
        }
        EngineCommand::ListJobs => {
            let result = api.list_jobs().await;
            sink.emit(EngineEvent::JobsListed { result });
        }
        EngineCommand::Export { target, dir } => {
            let result = match api.export(&target).await {
                Ok(bytes) => AtomicFileWriter::new(dir)
                    .write(&target.file_name(), &bytes)
                    .map_err(|err| ApiError::new(ApiFailure::Io, err.to_string())),
                Err(err) => Err(err),
            };
            sink.emit(EngineEvent::ExportSaved { target, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling { .. } => {}
    }
}
