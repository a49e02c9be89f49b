use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TrackerError;
use super::stage::Stage;
use super::state::*;

/// Reduces job snapshots onto a fixed, ordered stage list.
///
/// The stage list is frozen at construction. `reduce` is a pure function of
/// (stages, snapshot): it rebuilds the whole status array on every call and
/// keeps no state between calls.
#[derive(Debug, Clone)]
pub struct Reconciler {
    stages: Arc<[Stage]>,
}

impl Reconciler {
    pub fn new(stages: Vec<Stage>) -> Result<Self, TrackerError> {
        if stages.is_empty() {
            return Err(TrackerError::InvalidConfiguration(
                "stage list is empty, nothing to track".into(),
            ));
        }
        Ok(Self { stages: stages.into() })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Status array before the first poll: every stage pending.
    pub fn initial_statuses(&self) -> Vec<StageRuntimeStatus> {
        self.stages
            .iter()
            .map(|s| StageRuntimeStatus::pending(&s.id))
            .collect()
    }

    pub fn reduce(&self, snapshot: &JobSnapshot) -> Vec<StageRuntimeStatus> {
        let records: HashMap<&str, &CompletionRecord> = snapshot
            .completed_steps
            .iter()
            .map(|r| (r.step.as_str(), r))
            .collect();

        let current_index = snapshot
            .current_step
            .as_deref()
            .and_then(|current| self.stages.iter().position(|s| s.id == current));

        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let record = records.get(stage.id.as_str()).copied();

                // Failure is not attributed to a single stage: the backend
                // does not report which one broke.
                let status = if snapshot.status == JobStatus::Failed {
                    StageStatus::Error
                } else if record.is_some() || snapshot.status == JobStatus::Completed {
                    StageStatus::Completed
                } else {
                    match current_index {
                        Some(c) if i == c => StageStatus::Running,
                        Some(c) if i < c => StageStatus::Completed,
                        _ => StageStatus::Pending,
                    }
                };

                let metrics = record.filter(|_| status == StageStatus::Completed);
                StageRuntimeStatus {
                    stage_id: stage.id.clone(),
                    status,
                    duration_secs: metrics.and_then(|r| r.duration_secs),
                    tokens_used: metrics.map(|r| r.tokens_used),
                }
            })
            .collect()
    }

    /// Aggregate metrics for a reduced status array. `elapsed` is measured
    /// locally by the caller since tracking started.
    pub fn aggregate(
        &self,
        statuses: &[StageRuntimeStatus],
        snapshot: &JobSnapshot,
        elapsed: Duration,
    ) -> ProgressAggregate {
        let total = self.stages.len();
        let completed = statuses
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .count();

        let estimated_remaining_secs = if snapshot.status.is_terminal() {
            0
        } else {
            self.stages
                .iter()
                .zip(statuses)
                .filter(|(_, s)| s.status != StageStatus::Completed)
                .map(|(stage, _)| stage.estimated_secs)
                .sum()
        };

        ProgressAggregate {
            percent_complete: percent(completed, total),
            completed_stages: completed,
            total_stages: total,
            tokens_used: snapshot.total_tokens_used,
            elapsed,
            estimated_remaining_secs,
        }
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
