use serde::Serialize;
use crate::pipeline::{JobSnapshot, ProgressAggregate, Stage, StageRuntimeStatus};

/// Messages sent from a polling session to whatever renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// Polling started for a job
    Started {
        job_id: String,
        stages: Vec<Stage>,
    },
    /// A snapshot was fetched and reconciled
    Updated {
        statuses: Vec<StageRuntimeStatus>,
        aggregate: ProgressAggregate,
    },
    /// The job completed or failed
    Finished {
        snapshot: JobSnapshot,
    },
    /// Polling was cancelled before the job finished
    Cancelled,
}
