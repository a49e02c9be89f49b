pub mod stage;
pub mod state;
pub mod reconcile;
pub mod poller;

pub use stage::{default_stages, Stage};
pub use state::*;
pub use reconcile::Reconciler;
pub use poller::PollHandle;
