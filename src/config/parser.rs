use std::collections::HashSet;
use std::path::Path;
use crate::errors::TrackerError;
use super::types::TrackerConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

pub async fn parse_config(path: &Path) -> Result<TrackerConfig, TrackerError> {
    if !path.exists() {
        return Err(TrackerError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(TrackerError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    // Parse into typed config
    let config: TrackerConfig = serde_yaml::from_value(yaml)?;

    validate_config(&config)?;

    Ok(config)
}

/// Parse `path` if given, otherwise validate and return the defaults.
pub async fn load_or_default(path: Option<&Path>) -> Result<TrackerConfig, TrackerError> {
    match path {
        Some(p) => parse_config(p).await,
        None => {
            debug!("No config file given, using built-in defaults");
            let config = TrackerConfig::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), TrackerError> {
    // Convert YAML value to JSON for schema validation
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| TrackerError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| TrackerError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; the typed parse and semantic checks are authoritative
        for e in errors {
            warn!(validation_error = %e, path = %e.instance_path, "Config schema warning");
        }
    }

    Ok(())
}

/// Semantic checks the typed parse cannot express.
pub fn validate_config(config: &TrackerConfig) -> Result<(), TrackerError> {
    if let Some(stages) = &config.stages {
        if stages.is_empty() {
            return Err(TrackerError::InvalidConfiguration(
                "stages list is empty, nothing to track".into(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in stages {
            if stage.id.trim().is_empty() {
                return Err(TrackerError::Config("Stage with empty id".into()));
            }
            if !seen.insert(stage.id.as_str()) {
                return Err(TrackerError::Config(format!("Duplicate stage id '{}'", stage.id)));
            }
        }
    }

    if config.polling.interval_ms == 0 {
        return Err(TrackerError::Config("polling.interval_ms must be greater than zero".into()));
    }

    if config.endpoint.timeout_secs == 0 {
        return Err(TrackerError::Config("endpoint.timeout_secs must be greater than zero".into()));
    }

    if !config.endpoint.status_path.contains("{job_id}") {
        return Err(TrackerError::Config(format!(
            "endpoint.status_path '{}' has no {{job_id}} placeholder",
            config.endpoint.status_path
        )));
    }

    if config.endpoint.timeout_secs.saturating_mul(1000) > config.polling.interval_ms.saturating_mul(10) {
        warn!(
            timeout_secs = config.endpoint.timeout_secs,
            interval_ms = config.polling.interval_ms,
            "Request timeout spans many poll intervals; slow responses will skip ticks"
        );
    }

    Ok(())
}
