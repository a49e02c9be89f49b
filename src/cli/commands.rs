use clap::{Parser, Subcommand, Args};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "stagewatch",
    version,
    long_version = LONG_VERSION,
    about = "Track analysis jobs stage by stage"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll a job until it completes or fails
    Watch(WatchArgs),
    /// Reconcile a single snapshot file against the pipeline
    Reduce(ReduceArgs),
    /// List the configured pipeline stages
    Stages(StagesArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct WatchArgs {
    /// Analysis job identifier
    pub job_id: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Backend base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Poll interval in milliseconds (overrides config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Bearer token, or $VAR to read it from the environment (overrides config)
    #[arg(long)]
    pub token: Option<String>,

    /// Read snapshots from a local JSON file instead of the backend
    #[arg(long)]
    pub from_file: Option<String>,

    /// Output events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ReduceArgs {
    /// Snapshot JSON file
    #[arg(short, long)]
    pub snapshot: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct StagesArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}
