use futures_util::StreamExt;
use jobwatch_logging::{jobwatch_debug, jobwatch_trace};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{CreateJobResponse, Envelope, JobListResponse};
use crate::{
    ApiError, ApiFailure, CreateJobRequest, CreatedJob, EngineConfig, ExportTarget,
    JobStatusPayload, JobSummary,
};

/// Client side of the job server contract.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatusPayload, ApiError>;

    /// Acknowledgement only; the stop itself shows up in later polls.
    async fn stop_job(&self, job_id: &str) -> Result<(), ApiError>;

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError>;

    async fn export(&self, target: &ExportTarget) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpJobApi {
    base: Url,
    client: reqwest::Client,
    max_export_bytes: u64,
}

impl HttpJobApi {
    pub fn new(config: &EngineConfig) -> Result<Self, ApiError> {
        let base = parse_base(&config.base_url)?;
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(ApiFailure::Network, err.to_string()))?;
        Ok(Self {
            base,
            client,
            max_export_bytes: config.max_export_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.base, segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        jobwatch_trace!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Vec<u8>,
    ) -> Result<T, ApiError> {
        jobwatch_trace!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl JobApi for HttpJobApi {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<CreatedJob, ApiError> {
        let url = self.endpoint(&[request.kind().path()])?;
        let body = request
            .to_json()
            .map_err(|err| ApiError::new(ApiFailure::Malformed, err.to_string()))?;
        let response: CreateJobResponse = self.post_json(url, body).await?;
        match (response.ok, response.job_id) {
            (true, Some(job_id)) => Ok(CreatedJob {
                job_id,
                total: response.total.unwrap_or(0),
            }),
            (true, None) => Err(ApiError::new(ApiFailure::Malformed, "response without job_id")),
            (false, _) => Err(rejected(response.error)),
        }
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusPayload, ApiError> {
        let url = self.endpoint(&["jobs", job_id])?;
        let payload: JobStatusPayload = self.get_json(url).await?;
        if !payload.ok {
            return Err(rejected(payload.error));
        }
        Ok(payload)
    }

    async fn stop_job(&self, job_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["jobs", job_id, "stop"])?;
        let envelope: Envelope = self.post_json(url, b"{}".to_vec()).await?;
        if !envelope.ok {
            return Err(rejected(envelope.error));
        }
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        let url = self.endpoint(&["jobs"])?;
        let response: JobListResponse = self.get_json(url).await?;
        if !response.ok {
            return Err(rejected(response.error));
        }
        Ok(response.jobs)
    }

    async fn export(&self, target: &ExportTarget) -> Result<Vec<u8>, ApiError> {
        let url = export_url(&self.base, target)?;
        jobwatch_debug!("Downloading export {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            return Err(error_from_body(status, &body));
        }

        let max_bytes = self.max_export_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes)
        {
            return Err(ApiError::new(
                ApiFailure::TooLarge { max_bytes },
                "export too large",
            ));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::new(
                    ApiFailure::TooLarge { max_bytes },
                    "export too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Full download URL for an export, as shown to the user.
pub fn export_url(base: &Url, target: &ExportTarget) -> Result<Url, ApiError> {
    match target {
        ExportTarget::Results {
            job_id,
            verdict_query,
        } => {
            let mut url = endpoint_url(base, &["jobs", job_id, "xlsx"])?;
            if let Some(query) = verdict_query {
                url.query_pairs_mut().append_pair("verdict", query);
            }
            Ok(url)
        }
        ExportTarget::Search { job_id } => endpoint_url(base, &["jobs", job_id, "search-xlsx"]),
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url =
        Url::parse(raw).map_err(|err| ApiError::new(ApiFailure::InvalidUrl, err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::new(
            ApiFailure::InvalidUrl,
            format!("{raw} cannot be a base"),
        ));
    }
    Ok(url)
}

fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| ApiError::new(ApiFailure::InvalidUrl, base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }
    serde_json::from_slice(&body)
        .map_err(|err| ApiError::new(ApiFailure::Malformed, err.to_string()))
}

/// A JSON error body is a server verdict; anything else is a transport problem.
fn error_from_body(status: reqwest::StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<Envelope>(body) {
        Ok(envelope) => rejected(envelope.error.or_else(|| Some(status.to_string()))),
        Err(_) => ApiError::new(ApiFailure::HttpStatus(status.as_u16()), status.to_string()),
    }
}

fn rejected(message: Option<String>) -> ApiError {
    ApiError::new(
        ApiFailure::Rejected,
        message.unwrap_or_else(|| "request failed".to_string()),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailure::Timeout, err.to_string());
    }
    ApiError::new(ApiFailure::Network, err.to_string())
}
