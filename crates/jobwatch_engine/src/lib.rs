//! Jobwatch engine: job server client, poll loop and file output.
mod api;
mod clock;
mod config;
mod engine;
mod persist;
mod poller;
mod types;

pub use api::{export_url, HttpJobApi, JobApi};
pub use clock::{Clock, SystemClock};
pub use config::EngineConfig;
pub use engine::EngineHandle;
pub use persist::{ensure_dir, write_atomically, AtomicFileWriter, PersistError};
pub use poller::{ChannelEventSink, EventSink, Poller};
pub use types::{
    ApiError, ApiFailure, AutoBatchBody, BatchBody, CreateJobRequest, CreatedJob, EngineEvent,
    ExportTarget, JobId, JobKind, JobStatusPayload, JobSummary, MetaPayload, ResultPayload,
    RulesPayload, SearchOnlyBody, SearchSettings,
};
