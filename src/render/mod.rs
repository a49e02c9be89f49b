pub mod events;
pub mod progress;
pub mod json;

pub use events::TrackerEvent;
pub use progress::WatchProgress;
pub use json::JsonLines;

/// Anything that can display a stream of tracker events.
pub trait EventRenderer {
    fn handle_event(&mut self, event: &TrackerEvent);
}
