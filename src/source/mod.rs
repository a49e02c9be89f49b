pub mod provider;
pub mod http;
pub mod file;

pub use provider::SnapshotSource;
pub use http::HttpSnapshotSource;
pub use file::FileSnapshotSource;
