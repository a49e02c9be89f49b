pub mod commands;
pub mod watch;
pub mod reduce;
pub mod stages;

pub use commands::{Cli, Commands};
