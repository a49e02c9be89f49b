use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use crate::config::EndpointConfig;
use crate::errors::TrackerError;
use crate::pipeline::state::JobSnapshot;
use super::provider::SnapshotSource;
use tracing::debug;

pub struct HttpSnapshotSource {
    client: Client,
    base_url: String,
    status_path: String,
    token: Option<String>,
}

impl HttpSnapshotSource {
    pub fn new(
        base_url: &str,
        status_path: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            status_path: status_path.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(endpoint: &EndpointConfig) -> Result<Self, TrackerError> {
        Self::new(
            &endpoint.base_url,
            &endpoint.status_path,
            endpoint.resolved_token(),
            Duration::from_secs(endpoint.timeout_secs),
        )
    }

    /// Full status URL for a job. The job id always lands as exactly one
    /// percent-encoded path segment.
    pub fn status_url(&self, job_id: &str) -> Result<Url, TrackerError> {
        check_job_id(job_id)?;

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TrackerError::Config(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TrackerError::Config(format!("Base URL cannot carry a path: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in self.status_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace("{job_id}", job_id));
            }
        }
        Ok(url)
    }
}

fn check_job_id(job_id: &str) -> Result<(), TrackerError> {
    let malformed = job_id.is_empty()
        || job_id == "."
        || job_id == ".."
        || job_id.chars().any(|c| matches!(c, '/' | '\\' | '?' | '#') || c.is_control());
    if malformed {
        return Err(TrackerError::InvalidConfiguration(format!("Invalid job id: {:?}", job_id)));
    }
    Ok(())
}

fn map_status(status: StatusCode, job_id: &str, body: &str) -> TrackerError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body.chars().take(200).collect::<String>())
    };
    match status.as_u16() {
        401 | 403 => TrackerError::Authentication(detail),
        404 => TrackerError::NotFound(job_id.to_string()),
        429 => TrackerError::RateLimit(detail),
        _ => TrackerError::Network(format!("Unexpected status {}", detail)),
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, job_id: &str) -> Result<JobSnapshot, TrackerError> {
        let url = self.status_url(job_id)?;
        debug!(url = %url, "Fetching job snapshot");

        let mut req = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                TrackerError::Timeout(format!("Status request timed out: {}", e))
            } else {
                TrackerError::Network(format!("Status request failed: {}", e))
            }
        })?;

        let status = resp.status();
        let body = resp.text().await
            .map_err(|e| TrackerError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(map_status(status, job_id, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| TrackerError::Decode(format!("Invalid status response: {}", e)))
    }

    fn validate_job_id(&self, job_id: &str) -> Result<(), TrackerError> {
        self.status_url(job_id).map(|_| ())
    }

    fn source_name(&self) -> &str { "http" }
}
