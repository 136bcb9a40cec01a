use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use jobwatch_logging::{jobwatch_debug, jobwatch_info, set_poll_cycle};
use tokio_util::sync::CancellationToken;

use crate::{Clock, EngineEvent, JobApi, JobId};

/// Receives events produced on the engine runtime.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct ActiveLoop {
    job_id: JobId,
    token: CancellationToken,
}

/// Repeating status fetch for at most one job at a time.
///
/// Each cycle waits for the previous response before sleeping the interval,
/// so requests never overlap. The loop ends on its own after a terminal
/// status or a rejected response.
pub struct Poller {
    api: Arc<dyn JobApi>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    active: Mutex<Option<ActiveLoop>>,
}

impl Poller {
    pub fn new(api: Arc<dyn JobApi>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            api,
            clock,
            interval,
            active: Mutex::new(None),
        }
    }

    /// Starts polling `job_id`, cancelling whatever loop was running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, job_id: JobId, sink: Arc<dyn EventSink>) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveLoop {
                job_id: job_id.clone(),
                token: token.clone(),
            });
        if let Some(previous) = previous {
            jobwatch_debug!("Superseding poll loop for {}", previous.job_id);
            previous.token.cancel();
        }

        jobwatch_info!("Polling {} every {:?}", job_id, self.interval);
        tokio::spawn(run_loop(
            self.api.clone(),
            self.clock.clone(),
            self.interval,
            job_id,
            token.clone(),
            sink,
        ));
        token
    }

    /// Cancels the loop if it is still polling `job_id`. Returns whether one was cancelled.
    pub fn stop(&self, job_id: &str) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(current) if current.job_id == job_id => {
                let was_running = !current.token.is_cancelled();
                current.token.cancel();
                *active = None;
                was_running
            }
            _ => false,
        }
    }

    pub fn stop_all(&self) {
        if let Some(current) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            current.token.cancel();
        }
    }

    /// Job currently being polled, if its loop has not ended.
    pub fn active_job(&self) -> Option<JobId> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|current| !current.token.is_cancelled())
            .map(|current| current.job_id.clone())
    }
}

async fn run_loop(
    api: Arc<dyn JobApi>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    job_id: JobId,
    token: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        set_poll_cycle(cycle);

        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = api.job_status(&job_id) => result,
        };
        if token.is_cancelled() {
            break;
        }

        let finished = match &result {
            Ok(payload) => payload.is_terminal(),
            Err(err) => !err.is_transient(),
        };
        sink.emit(EngineEvent::Status {
            job_id: job_id.clone(),
            observed_at: clock.now(),
            result,
        });
        if finished {
            jobwatch_debug!("Poll loop for {} finished after {} cycles", job_id, cycle);
            token.cancel();
            break;
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
