//! Generation status polling
//!
//! `idle -> polling -> {completed, failed}`. A poller belongs to exactly one epoch and
//! is owned by the session through a [`PollerHandle`]; dropping the handle aborts the
//! task, so every path that replaces or clears the handle also stops the timer.

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::{
    models::{Epoch, GenerationJob, GenerationStatus, StatusReport},
    services::{
        discovery::{Discovery, Session},
        notifications::Notification,
    },
};

/// Owning handle to the polling task of one epoch
#[derive(Debug)]
pub struct PollerHandle {
    epoch: Epoch,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stops the task; it never touches state again
    pub fn cancel(self) {
        drop(self);
    }

    /// Lets the task run to completion on its own (used by the task itself on
    /// terminal status)
    fn release(mut self) {
        self.task.take();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(epoch = %self.epoch, "Generation poller cancelled");
        }
    }
}

/// What the poll loop does after a status report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollStep {
    Continue,
    /// The epoch moved on; drop the report
    Stale,
    Completed { notify: bool },
    Failed,
    /// Backend no longer knows about any job
    Vanished,
}

/// Starts polling for `epoch` unless the epoch is gone or a poller already runs
pub(crate) async fn start(discovery: &Discovery, epoch: Epoch, job: GenerationJob) -> bool {
    let mut session = discovery.session().await;

    if !session.is_current(epoch) {
        tracing::debug!(epoch = %epoch, "Epoch superseded before polling started");
        return false;
    }
    if session.poller.is_some() {
        tracing::debug!(epoch = %epoch, "Generation poller already active");
        return false;
    }

    tracing::info!(epoch = %epoch, job_id = ?job.id, "Polling generation status");
    session.generation = job;
    session.poller = Some(PollerHandle {
        epoch,
        task: Some(tokio::spawn(run(discovery.clone(), epoch))),
    });
    true
}

// Boxed: the loop ends in a queue reload, which can start the next poller.
fn run(discovery: Discovery, epoch: Epoch) -> BoxFuture<'static, ()> {
    Box::pin(poll_loop(discovery, epoch))
}

async fn poll_loop(discovery: Discovery, epoch: Epoch) {
    let settings = discovery.settings().clone();
    let started = Instant::now();
    let mut ticker = interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if started.elapsed() >= settings.max_poll_duration {
            let mut session = discovery.session().await;
            expire(&mut session, epoch, settings.max_poll_duration.as_secs());
            break;
        }

        let report = match discovery.backend().poll_generation_status().await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, epoch = %epoch, "Generation status poll failed");
                continue;
            }
        };

        let step = {
            let mut session = discovery.session().await;
            reconcile(&mut session, epoch, &report)
        };

        match step {
            PollStep::Continue => continue,
            PollStep::Stale => {
                tracing::debug!(epoch = %epoch, "Discarding status for superseded epoch");
                break;
            }
            PollStep::Vanished => {
                tracing::warn!(epoch = %epoch, "Generation job disappeared while polling");
                break;
            }
            PollStep::Failed => {
                tracing::warn!(
                    epoch = %epoch,
                    error = ?report.error_message,
                    "Generation job failed"
                );
                break;
            }
            PollStep::Completed { notify } => {
                tracing::info!(epoch = %epoch, "Generation job completed, refreshing queue");
                match discovery.refresh_after_generation(epoch).await {
                    Ok(Some(_)) if notify => discovery
                        .notifier()
                        .notify(Notification::recommendations_ready()),
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        tracing::debug!(epoch = %epoch, "Refresh skipped, another load owns the queue")
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Refresh after generation failed")
                    }
                }
                break;
            }
        }
    }
}

/// Folds one status report into the session
///
/// Terminal states release the poller handle so the running task can finish its own
/// follow-up without being aborted.
pub(crate) fn reconcile(session: &mut Session, epoch: Epoch, report: &StatusReport) -> PollStep {
    if !session.is_current(epoch) {
        return PollStep::Stale;
    }

    if !report.has_job {
        session.generation = GenerationJob::idle();
        release(session);
        return PollStep::Vanished;
    }

    session.generation.apply(report);
    if !report.status.is_terminal() {
        return PollStep::Continue;
    }

    release(session);
    if report.status == GenerationStatus::Completed {
        PollStep::Completed {
            notify: !session.surface_active,
        }
    } else {
        PollStep::Failed
    }
}

/// Backstop for jobs that never reach a terminal status
pub(crate) fn expire(session: &mut Session, epoch: Epoch, max_secs: u64) {
    if !session.is_current(epoch) {
        return;
    }

    tracing::warn!(epoch = %epoch, max_secs, "Gave up waiting for generation job");
    session
        .generation
        .fail(format!("Generation did not finish within {} seconds", max_secs));
    release(session);
}

fn release(session: &mut Session) {
    if let Some(handle) = session.poller.take() {
        handle.release();
    }
}
