pub mod types;
pub mod classification;

pub use types::TrackerError;
pub use classification::ErrorClassification;
