use serde::{Deserialize, Serialize};
use crate::pipeline::{default_stages, Stage};
use super::credentials::resolve_credential;

pub const DEFAULT_STATUS_PATH: &str = "/api/analyses/{job_id}/status";
pub const DEFAULT_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub stages: Option<Vec<Stage>>,
}

impl TrackerConfig {
    /// Configured stages, or the built-in analysis pipeline.
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.clone().unwrap_or_else(default_stages)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub status_path: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl EndpointConfig {
    /// Token with `$VAR` references resolved from the environment.
    pub fn resolved_token(&self) -> Option<String> {
        self.token.as_deref().map(resolve_credential)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: DEFAULT_INTERVAL_MS }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_config_default() {
        let config = TrackerConfig::default();
        assert!(config.stages.is_none());
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.endpoint.status_path, DEFAULT_STATUS_PATH);
        assert_eq!(config.endpoint.timeout_secs, 10);
    }

    #[test]
    fn test_stages_fall_back_to_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.stages(), default_stages());
    }

    #[test]
    fn test_partial_endpoint_fills_defaults() {
        let config: TrackerConfig =
            serde_yaml::from_str("endpoint:\n  base_url: https://coach.example.com\n").unwrap();
        assert_eq!(config.endpoint.base_url, "https://coach.example.com");
        assert_eq!(config.endpoint.status_path, DEFAULT_STATUS_PATH);
        assert_eq!(config.polling.interval_ms, DEFAULT_INTERVAL_MS);
    }

    #[test]
    fn test_resolved_token_literal() {
        let endpoint = EndpointConfig {
            token: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(endpoint.resolved_token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_resolved_token_absent() {
        assert!(EndpointConfig::default().resolved_token().is_none());
    }
}
