use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overall job status as reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A stage the backend reports as finished, with its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(alias = "step_name")]
    pub step: String,
    #[serde(default, alias = "tokens")]
    pub tokens_used: u64,
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

/// Point-in-time status of one tracked job. Each poll yields a complete,
/// authoritative snapshot; nothing is merged with earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    #[serde(default, alias = "current_stage")]
    pub current_step: Option<String>,
    #[serde(default, alias = "error")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub total_tokens_used: u64,
    #[serde(default)]
    pub completed_steps: Vec<CompletionRecord>,
}

impl JobSnapshot {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            current_step: None,
            error_message: None,
            total_tokens_used: 0,
            completed_steps: Vec::new(),
        }
    }

    pub fn with_current(mut self, step: &str) -> Self {
        self.current_step = Some(step.to_string());
        self
    }

    pub fn with_completion(mut self, step: &str, tokens_used: u64, duration_secs: Option<f64>) -> Self {
        self.completed_steps.push(CompletionRecord {
            step: step.to_string(),
            tokens_used,
            duration_secs,
        });
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Derived status of one stage. Metrics are only present when the stage
/// was completed through an explicit completion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRuntimeStatus {
    pub stage_id: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl StageRuntimeStatus {
    pub fn pending(stage_id: &str) -> Self {
        Self {
            stage_id: stage_id.to_string(),
            status: StageStatus::Pending,
            duration_secs: None,
            tokens_used: None,
        }
    }
}

/// Aggregate figures shown alongside the stage list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressAggregate {
    pub percent_complete: u8,
    pub completed_stages: usize,
    pub total_stages: usize,
    pub tokens_used: u64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub estimated_remaining_secs: u64,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserialize_full() {
        let json = r#"{
            "status": "running",
            "current_step": "pattern_analysis",
            "total_tokens_used": 42,
            "completed_steps": [
                {"step": "data_extraction", "tokens_used": 10, "duration_secs": 4.5}
            ]
        }"#;
        let snap: JobSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.status, JobStatus::Running);
        assert_eq!(snap.current_step.as_deref(), Some("pattern_analysis"));
        assert_eq!(snap.total_tokens_used, 42);
        assert_eq!(snap.completed_steps[0].duration_secs, Some(4.5));
        assert!(snap.error_message.is_none());
    }

    #[test]
    fn test_snapshot_deserialize_minimal() {
        let snap: JobSnapshot = serde_json::from_str(r#"{"status": "pending"}"#).unwrap();
        assert_eq!(snap, JobSnapshot::new(JobStatus::Pending));
    }

    #[test]
    fn test_snapshot_deserialize_aliases() {
        let json = r#"{
            "status": "failed",
            "current_stage": "extract",
            "error": "timeout",
            "completed_steps": [{"step_name": "a", "tokens": 3}]
        }"#;
        let snap: JobSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.current_step.as_deref(), Some("extract"));
        assert_eq!(snap.error_message.as_deref(), Some("timeout"));
        assert_eq!(snap.completed_steps[0].step, "a");
        assert_eq!(snap.completed_steps[0].tokens_used, 3);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = serde_json::from_str::<JobSnapshot>(r#"{"status": "paused"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_runtime_status_omits_empty_metrics() {
        let json = serde_json::to_value(StageRuntimeStatus::pending("extract")).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("duration_secs").is_none());
        assert!(json.get("tokens_used").is_none());
    }

    #[test]
    fn test_aggregate_elapsed_serialized_as_millis() {
        let agg = ProgressAggregate {
            percent_complete: 50,
            completed_stages: 1,
            total_stages: 2,
            tokens_used: 7,
            elapsed: Duration::from_millis(1500),
            estimated_remaining_secs: 30,
        };
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["elapsed"], 1500);
    }
}
