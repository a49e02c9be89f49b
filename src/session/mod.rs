pub mod tracking;

pub use tracking::TrackingSession;
