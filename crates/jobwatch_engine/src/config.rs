use std::time::Duration;

/// Connection and cadence settings for the job server.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Server root; endpoint paths are appended to it.
    pub base_url: String,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
    /// `None` leaves requests bounded only by the transport.
    pub request_timeout: Option<Duration>,
    pub max_export_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            poll_interval: Duration::from_millis(2500),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_export_bytes: 50 * 1024 * 1024,
        }
    }
}
