use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::commands::WatchArgs;
use crate::config::{load_or_default, validate_config, TrackerConfig};
use crate::errors::TrackerError;
use crate::pipeline::{JobSnapshot, JobStatus, Reconciler};
use crate::render::{EventRenderer, JsonLines, TrackerEvent, WatchProgress};
use crate::session::TrackingSession;
use crate::source::{FileSnapshotSource, HttpSnapshotSource, SnapshotSource};
use tracing::info;

pub async fn handle_watch(args: WatchArgs, quiet: bool) -> Result<(), TrackerError> {
    let config = load_or_default(args.config.as_deref().map(Path::new)).await?;
    let config = apply_overrides(config, &args)?;

    let reconciler = Reconciler::new(config.stages())?;
    let source = build_source(&config, &args)?;
    let interval = Duration::from_millis(config.polling.interval_ms);

    info!(
        job_id = %args.job_id,
        source = source.source_name(),
        interval_ms = config.polling.interval_ms,
        stages = reconciler.stages().len(),
        "Watching analysis job"
    );

    let mut renderer: Box<dyn EventRenderer> = if args.json {
        Box::new(JsonLines::new(std::io::stdout()))
    } else if quiet {
        Box::new(WatchProgress::hidden())
    } else {
        Box::new(WatchProgress::new())
    };

    let (session, mut events) = TrackingSession::start(&reconciler, source, &args.job_id, interval)?;
    let outcome = drive(&session, &mut events, renderer.as_mut()).await;

    match outcome {
        Some(snapshot) => report_outcome(&args.job_id, &snapshot, quiet || args.json),
        None => Ok(()),
    }
}

/// Pick the snapshot source and check the job id against it once, so an id
/// that can never be fetched fails here instead of on every tick.
fn build_source(config: &TrackerConfig, args: &WatchArgs) -> Result<Arc<dyn SnapshotSource>, TrackerError> {
    let source: Arc<dyn SnapshotSource> = match &args.from_file {
        Some(path) => Arc::new(FileSnapshotSource::new(path)),
        None => Arc::new(HttpSnapshotSource::from_config(&config.endpoint)?),
    };
    source.validate_job_id(&args.job_id)?;
    Ok(source)
}

/// Feed events to the renderer until the job finishes or Ctrl+C is hit.
/// Returns the final snapshot, or `None` if watching was interrupted.
async fn drive(
    session: &TrackingSession,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<TrackerEvent>,
    renderer: &mut dyn EventRenderer,
) -> Option<JobSnapshot> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    renderer.handle_event(&event);
                    if let TrackerEvent::Finished { snapshot } = event {
                        return Some(snapshot);
                    }
                }
                None => return None,
            },
            _ = &mut ctrl_c => {
                info!(job_id = %session.job_id(), "Received Ctrl+C, cancelling watch");
                session.cancel();
                renderer.handle_event(&TrackerEvent::Cancelled);
                return None;
            }
        }
    }
}

fn report_outcome(job_id: &str, snapshot: &JobSnapshot, quiet: bool) -> Result<(), TrackerError> {
    match snapshot.status {
        JobStatus::Failed => Err(TrackerError::JobFailed(
            snapshot
                .error_message
                .clone()
                .unwrap_or_else(|| format!("job {} failed without an error message", job_id)),
        )),
        _ => {
            if quiet {
                info!(job_id = %job_id, tokens = snapshot.total_tokens_used, "Analysis complete");
            }
            Ok(())
        }
    }
}

/// Layer command-line flags over the loaded configuration.
pub fn apply_overrides(mut config: TrackerConfig, args: &WatchArgs) -> Result<TrackerConfig, TrackerError> {
    if let Some(base_url) = &args.base_url {
        config.endpoint.base_url = base_url.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        config.polling.interval_ms = interval_ms;
    }
    if let Some(token) = &args.token {
        config.endpoint.token = Some(token.clone());
    }
    validate_config(&config)?;
    Ok(config)
}
