pub mod cli;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod source;
pub mod utils;

pub use errors::TrackerError;
pub use pipeline::{JobSnapshot, JobStatus, PollHandle, Reconciler, Stage, StageRuntimeStatus, StageStatus};
pub use source::SnapshotSource;
