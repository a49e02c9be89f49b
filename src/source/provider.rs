use async_trait::async_trait;
use crate::errors::TrackerError;
use crate::pipeline::state::JobSnapshot;

/// Where job snapshots come from. One call is one poll; implementations own
/// any request timeout.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<JobSnapshot, TrackerError>;

    /// Reject a job id this source can never fetch, before any polling starts.
    fn validate_job_id(&self, _job_id: &str) -> Result<(), TrackerError> {
        Ok(())
    }

    /// Source name for logging
    fn source_name(&self) -> &str;
}
