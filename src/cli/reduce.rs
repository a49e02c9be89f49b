use std::path::Path;
use std::time::Duration;
use console::style;
use serde_json::json;

use crate::cli::commands::ReduceArgs;
use crate::config::load_or_default;
use crate::errors::TrackerError;
use crate::pipeline::{Reconciler, StageStatus};
use crate::render::progress::stage_message;
use crate::source::file::read_snapshot;
use tracing::info;

pub async fn handle_reduce(args: ReduceArgs) -> Result<(), TrackerError> {
    let config = load_or_default(args.config.as_deref().map(Path::new)).await?;
    let reconciler = Reconciler::new(config.stages())?;

    let snapshot = read_snapshot(Path::new(&args.snapshot)).await?;
    info!(snapshot = %args.snapshot, status = %snapshot.status, "Reducing snapshot");

    let statuses = reconciler.reduce(&snapshot);
    let aggregate = reconciler.aggregate(&statuses, &snapshot, Duration::ZERO);

    if args.json {
        let out = json!({
            "status": snapshot.status,
            "statuses": statuses,
            "percent_complete": aggregate.percent_complete,
            "completed_stages": aggregate.completed_stages,
            "total_stages": aggregate.total_stages,
            "tokens_used": aggregate.tokens_used,
            "estimated_remaining_secs": aggregate.estimated_remaining_secs,
            "error_message": snapshot.error_message,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Job {} | {}/{} stages | {}%",
        snapshot.status, aggregate.completed_stages, aggregate.total_stages, aggregate.percent_complete
    );
    for (stage, status) in reconciler.stages().iter().zip(&statuses) {
        let label = match status.status {
            StageStatus::Pending => style(format!("{:<9}", status.status)).dim(),
            StageStatus::Running => style(format!("{:<9}", status.status)).yellow(),
            StageStatus::Completed => style(format!("{:<9}", status.status)).green(),
            StageStatus::Error => style(format!("{:<9}", status.status)).red(),
        };
        println!("  {} {}", label, stage_message(stage, status));
    }
    if let Some(error) = &snapshot.error_message {
        println!("Error: {}", error);
    }

    Ok(())
}
