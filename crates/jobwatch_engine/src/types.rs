use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Server endpoint family a job is created through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// `POST /batch`: explicit URL list.
    Batch,
    /// `POST /auto-batch`: search, seller pass, then testing.
    AutoBatch,
    /// `POST /search-only`: collection without testing.
    SearchOnly,
}

impl JobKind {
    pub fn path(self) -> &'static str {
        match self {
            JobKind::Batch => "batch",
            JobKind::AutoBatch => "auto-batch",
            JobKind::SearchOnly => "search-only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RulesPayload {
    pub ok_conditions: Vec<String>,
    pub error_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetaPayload {
    #[serde(rename = "ts_id", skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    pub search: String,
    pub seller: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SearchSettings {
    pub fresh_profile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchBody {
    /// Newline-joined list; the server splits and dedupes it again.
    pub urls: String,
    pub rules: RulesPayload,
    pub meta: MetaPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoBatchBody {
    pub search: String,
    pub seller: String,
    pub search_settings: SearchSettings,
    pub rules: RulesPayload,
    pub meta: MetaPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOnlyBody {
    pub search: String,
    pub seller: String,
    pub search_settings: SearchSettings,
    pub meta: MetaPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateJobRequest {
    Batch(BatchBody),
    AutoBatch(AutoBatchBody),
    SearchOnly(SearchOnlyBody),
}

impl CreateJobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            CreateJobRequest::Batch(_) => JobKind::Batch,
            CreateJobRequest::AutoBatch(_) => JobKind::AutoBatch,
            CreateJobRequest::SearchOnly(_) => JobKind::SearchOnly,
        }
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            CreateJobRequest::Batch(body) => serde_json::to_vec(body),
            CreateJobRequest::AutoBatch(body) => serde_json::to_vec(body),
            CreateJobRequest::SearchOnly(body) => serde_json::to_vec(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedJob {
    pub job_id: JobId,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateJobResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Minimal shape shared by every response; used to read error bodies.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ResultPayload {
    pub url: String,
    pub verdict: Option<String>,
    pub verdict_reason: Option<String>,
}

/// `GET /jobs/<id>` body. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct JobStatusPayload {
    pub ok: bool,
    pub status: String,
    pub done: u64,
    pub total: u64,
    pub started_at: Option<f64>,
    pub error: Option<String>,
    pub phase: Option<String>,
    pub phase_count: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub search_done: bool,
    pub search_total: Option<u64>,
    pub seller_kept: Option<u64>,
    pub seller_checked: Option<u64>,
    pub collected_count: Option<u64>,
    pub current_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pending_urls: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<ResultPayload>,
}

impl JobStatusPayload {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "done" | "stopped")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row of `GET /jobs`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub status: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub done: u64,
    #[serde(default)]
    pub created_at: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobListResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Spreadsheet exports offered once a job has results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// `GET /jobs/<id>/xlsx[?verdict=...]`
    Results {
        job_id: JobId,
        verdict_query: Option<String>,
    },
    /// `GET /jobs/<id>/search-xlsx`
    Search { job_id: JobId },
}

impl ExportTarget {
    pub fn job_id(&self) -> &str {
        match self {
            ExportTarget::Results { job_id, .. } | ExportTarget::Search { job_id } => job_id,
        }
    }

    /// File name the download is saved under.
    pub fn file_name(&self) -> String {
        match self {
            ExportTarget::Results {
                job_id,
                verdict_query: None,
            } => format!("{job_id}.xlsx"),
            ExportTarget::Results {
                job_id,
                verdict_query: Some(query),
            } => format!("{job_id}-{}.xlsx", query.replace(',', "-")),
            ExportTarget::Search { job_id } => format!("{job_id}-search.xlsx"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobCreated {
        kind: JobKind,
        result: Result<CreatedJob, ApiError>,
    },
    /// One poll-loop observation.
    Status {
        job_id: JobId,
        observed_at: f64,
        result: Result<JobStatusPayload, ApiError>,
    },
    StopSent {
        job_id: JobId,
        result: Result<(), ApiError>,
    },
    Probed {
        job_id: JobId,
        result: Result<JobStatusPayload, ApiError>,
    },
    JobsListed {
        result: Result<Vec<JobSummary>, ApiError>,
    },
    ExportSaved {
        target: ExportTarget,
        result: Result<PathBuf, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidUrl,
    Network,
    Timeout,
    /// Body did not parse as the expected JSON.
    Malformed,
    /// Well-formed `ok:false` answer.
    Rejected,
    /// Non-success status without a readable body.
    HttpStatus(u16),
    TooLarge { max_bytes: u64 },
    Io,
}

impl ApiFailure {
    /// Transient failures are retried by the next poll tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiFailure::Network
                | ApiFailure::Timeout
                | ApiFailure::Malformed
                | ApiFailure::HttpStatus(_)
        )
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidUrl => write!(f, "invalid url"),
            ApiFailure::Network => write!(f, "network error"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::Malformed => write!(f, "malformed response"),
            ApiFailure::Rejected => write!(f, "rejected"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::TooLarge { max_bytes } => {
                write!(f, "response too large (max {max_bytes})")
            }
            ApiFailure::Io => write!(f, "io error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_tolerates_missing_and_null_fields() {
        let payload: JobStatusPayload = serde_json::from_str(
            r#"{"ok": true, "status": "running", "pending_urls": null, "results": [{"url": "a"}], "search_done": null}"#,
        )
        .unwrap();
        assert_eq!(payload.status, "running");
        assert_eq!(payload.done, 0);
        assert!(payload.pending_urls.is_empty());
        assert!(!payload.search_done);
        assert_eq!(payload.results[0].verdict, None);
        assert!(!payload.is_terminal());
    }

    #[test]
    fn meta_uses_server_field_names() {
        let meta = MetaPayload {
            scenario_id: Some("tecno".into()),
            search: "kettle".into(),
            seller: String::new(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["ts_id"], "tecno");
    }

    #[test]
    fn export_file_names_reflect_filter() {
        let all = ExportTarget::Results {
            job_id: "j1".into(),
            verdict_query: None,
        };
        let some = ExportTarget::Results {
            job_id: "j1".into(),
            verdict_query: Some("ok,nok".into()),
        };
        assert_eq!(all.file_name(), "j1.xlsx");
        assert_eq!(some.file_name(), "j1-ok-nok.xlsx");
        assert_eq!(
            ExportTarget::Search { job_id: "j1".into() }.file_name(),
            "j1-search.xlsx"
        );
    }
}
