use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::TrackerError;
use crate::source::SnapshotSource;
use super::reconcile::Reconciler;
use super::state::{JobSnapshot, ProgressAggregate, StageRuntimeStatus};

thread_local! {
    /// Session whose callback is running on this thread, if any.
    static IN_CALLBACK: Cell<Option<Uuid>> = const { Cell::new(None) };
}

struct CallbackScope {
    previous: Option<Uuid>,
}

impl CallbackScope {
    fn enter(session_id: Uuid) -> Self {
        let previous = IN_CALLBACK.with(|c| c.replace(Some(session_id)));
        Self { previous }
    }
}

impl Drop for CallbackScope {
    fn drop(&mut self) {
        IN_CALLBACK.with(|c| c.set(self.previous));
    }
}

struct SessionShared {
    session_id: Uuid,
    cancel: CancellationToken,
    closed: CancellationToken,
    // Held while a callback runs; `cancel` waits on it so nothing fires
    // after `cancel` returns.
    callback_gate: Mutex<()>,
}

/// Handle to one polling session. Cloning shares the session.
#[derive(Clone)]
pub struct PollHandle {
    shared: Arc<SessionShared>,
}

impl PollHandle {
    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    /// Stop polling. No callback fires after this returns. Idempotent, and
    /// safe to call from inside the session's own callbacks.
    ///
    /// Outside its own callbacks this briefly blocks the calling thread on
    /// the session's callback lock, waiting for a running callback to
    /// return. A callback must therefore never block on the thread calling
    /// `cancel`: two sessions cancelling each other from their callbacks on
    /// a multi-thread runtime can deadlock.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        let reentrant = IN_CALLBACK.with(|c| c.get() == Some(self.shared.session_id));
        if !reentrant {
            drop(self.shared.callback_gate.lock().unwrap_or_else(|e| e.into_inner()));
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Resolves once the polling task has exited.
    pub async fn closed(&self) {
        self.shared.closed.cancelled().await
    }
}

impl Reconciler {
    /// Start polling `job_id` every `interval` on the current tokio runtime.
    ///
    /// Each tick performs exactly one fetch; a tick that comes due while a
    /// fetch is still in flight is skipped. Failed fetches leave the status
    /// untouched. `on_update` fires after every successful fetch,
    /// `on_terminal` at most once when the job completes or fails, after
    /// which the session stops itself.
    pub fn start_polling<U, T>(
        &self,
        source: Arc<dyn SnapshotSource>,
        job_id: &str,
        interval: Duration,
        on_update: U,
        on_terminal: T,
    ) -> Result<PollHandle, TrackerError>
    where
        U: FnMut(&[StageRuntimeStatus], &ProgressAggregate) + Send + 'static,
        T: FnOnce(&JobSnapshot) + Send + 'static,
    {
        if interval.is_zero() {
            return Err(TrackerError::InvalidConfiguration(
                "polling interval must be greater than zero".into(),
            ));
        }
        source.validate_job_id(job_id)?;

        let shared = Arc::new(SessionShared {
            session_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            closed: CancellationToken::new(),
            callback_gate: Mutex::new(()),
        });

        let span = info_span!(
            "poll",
            session_id = %shared.session_id,
            job_id = %job_id,
            source = source.source_name(),
        );

        let session = PollSession {
            reconciler: self.clone(),
            source,
            job_id: job_id.to_string(),
            interval,
            shared: shared.clone(),
        };
        tokio::spawn(session.run(on_update, on_terminal).instrument(span));

        Ok(PollHandle { shared })
    }
}

struct PollSession {
    reconciler: Reconciler,
    source: Arc<dyn SnapshotSource>,
    job_id: String,
    interval: Duration,
    shared: Arc<SessionShared>,
}

impl PollSession {
    async fn run<U, T>(self, mut on_update: U, on_terminal: T)
    where
        U: FnMut(&[StageRuntimeStatus], &ProgressAggregate) + Send + 'static,
        T: FnOnce(&JobSnapshot) + Send + 'static,
    {
        let _closed = self.shared.closed.clone().drop_guard();
        let cancel = self.shared.cancel.clone();
        let started = Instant::now();
        let mut on_terminal = Some(on_terminal);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = self.interval.as_millis() as u64, "Polling started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Cancelled with fetch in flight, discarding result");
                    break;
                }
                result = self.source.fetch(&self.job_id) => result,
            };

            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    let class = e.classify();
                    if class.transient {
                        warn!(error_type = class.error_type, error = %e, "Snapshot fetch failed, skipping tick");
                    } else {
                        error!(error_type = class.error_type, error = %e, "Snapshot fetch failed, skipping tick");
                    }
                    continue;
                }
            };

            let statuses = self.reconciler.reduce(&snapshot);
            let aggregate = self.reconciler.aggregate(&statuses, &snapshot, started.elapsed());
            debug!(
                status = %snapshot.status,
                current_step = snapshot.current_step.as_deref().unwrap_or("-"),
                percent = aggregate.percent_complete,
                "Snapshot applied"
            );

            let stop = {
                let _gate = self.shared.callback_gate.lock().unwrap_or_else(|e| e.into_inner());
                if cancel.is_cancelled() {
                    true
                } else {
                    let _scope = CallbackScope::enter(self.shared.session_id);
                    on_update(&statuses, &aggregate);

                    if snapshot.status.is_terminal() {
                        // on_update may have cancelled the session itself
                        if !cancel.is_cancelled() {
                            if let Some(callback) = on_terminal.take() {
                                info!(
                                    status = %snapshot.status,
                                    error = snapshot.error_message.as_deref().unwrap_or(""),
                                    "Job reached terminal state"
                                );
                                callback(&snapshot);
                            }
                        }
                        cancel.cancel();
                        true
                    } else {
                        false
                    }
                }
            };
            if stop {
                break;
            }
        }

        debug!("Polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::Stage;
    use crate::pipeline::state::JobStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource(JobSnapshot);

    #[async_trait]
    impl SnapshotSource for FixedSource {
        async fn fetch(&self, _job_id: &str) -> Result<JobSnapshot, TrackerError> {
            Ok(self.0.clone())
        }

        fn source_name(&self) -> &str { "fixed" }
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(vec![Stage {
            id: "only".into(),
            name: "Only".into(),
            description: String::new(),
            icon: "step".into(),
            estimated_secs: 1,
        }])
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected() {
        let source = Arc::new(FixedSource(JobSnapshot::new(JobStatus::Running)));
        let result = reconciler().start_polling(source, "job", Duration::ZERO, |_, _| {}, |_| {});
        assert!(matches!(result, Err(TrackerError::InvalidConfiguration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_from_inside_update_does_not_deadlock() {
        let source = Arc::new(FixedSource(JobSnapshot::new(JobStatus::Running)));
        let updates = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<PollHandle>>> = Arc::new(Mutex::new(None));

        let updates_cb = updates.clone();
        let slot_cb = slot.clone();
        let handle = reconciler()
            .start_polling(
                source,
                "job",
                Duration::from_millis(100),
                move |_, _| {
                    updates_cb.fetch_add(1, Ordering::SeqCst);
                    if let Some(h) = slot_cb.lock().unwrap().as_ref() {
                        h.cancel();
                    }
                },
                |_| {},
            )
            .unwrap();
        *slot.lock().unwrap() = Some(handle.clone());

        handle.closed().await;
        assert!(handle.is_cancelled());
        assert!(updates.load(Ordering::SeqCst) >= 1);
        let seen = updates.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(updates.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let source = Arc::new(FixedSource(JobSnapshot::new(JobStatus::Running)));
        let handle = reconciler()
            .start_polling(source, "job", Duration::from_millis(100), |_, _| {}, |_| {})
            .unwrap();
        handle.cancel();
        handle.cancel();
        handle.closed().await;
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_have_distinct_ids() {
        let r = reconciler();
        let source: Arc<dyn SnapshotSource> = Arc::new(FixedSource(JobSnapshot::new(JobStatus::Running)));
        let a = r.start_polling(source.clone(), "a", Duration::from_millis(100), |_, _| {}, |_| {}).unwrap();
        let b = r.start_polling(source, "b", Duration::from_millis(100), |_, _| {}, |_| {}).unwrap();
        assert_ne!(a.session_id(), b.session_id());
        a.cancel();
        b.cancel();
    }
}
