use async_trait::async_trait;
use std::path::{Path, PathBuf};
use crate::errors::TrackerError;
use crate::pipeline::state::JobSnapshot;
use super::provider::SnapshotSource;

/// Re-reads a snapshot JSON file on every fetch. Handy for driving the
/// tracker by hand while editing the file.
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub async fn read_snapshot(path: &Path) -> Result<JobSnapshot, TrackerError> {
    let content = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| TrackerError::Decode(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self, _job_id: &str) -> Result<JobSnapshot, TrackerError> {
        read_snapshot(&self.path).await
    }

    fn source_name(&self) -> &str { "file" }
}
