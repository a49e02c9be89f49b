use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::TrackerError;
use crate::pipeline::{PollHandle, Reconciler};
use crate::render::TrackerEvent;
use crate::source::SnapshotSource;

/// One watched job: the polling session plus the event stream feeding a
/// renderer. Dropped after the job finishes or the watch is cancelled.
pub struct TrackingSession {
    job_id: String,
    handle: PollHandle,
}

impl TrackingSession {
    /// Start polling and return the session with its event receiver. The
    /// first event is always `Started`; the stream ends after `Finished`
    /// or once the session is cancelled.
    pub fn start(
        reconciler: &Reconciler,
        source: Arc<dyn SnapshotSource>,
        job_id: &str,
        interval: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TrackerEvent>), TrackerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TrackerEvent::Started {
            job_id: job_id.to_string(),
            stages: reconciler.stages().to_vec(),
        });

        let update_tx = tx.clone();
        let handle = reconciler.start_polling(
            source,
            job_id,
            interval,
            move |statuses, aggregate| {
                let _ = update_tx.send(TrackerEvent::Updated {
                    statuses: statuses.to_vec(),
                    aggregate: aggregate.clone(),
                });
            },
            move |snapshot| {
                let _ = tx.send(TrackerEvent::Finished {
                    snapshot: snapshot.clone(),
                });
            },
        )?;
        debug!(job_id = %job_id, session_id = %handle.session_id(), "Tracking session started");

        Ok((
            Self {
                job_id: job_id.to_string(),
                handle,
            },
            rx,
        ))
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn handle(&self) -> &PollHandle {
        &self.handle
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }
}
