use std::sync::Arc;
use std::time::Duration;

use dubber_logging::{dub_debug, dub_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::sink::EventSink;
use crate::status::StatusSource;
use crate::{EngineEvent, Generation};

/// How a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// The service reported a terminal phase.
    Finished,
    /// A status query failed; the job is not polled again.
    QueryFailed,
    Stopped,
}

/// Polls one job's status until it reaches a terminal phase.
///
/// Queries are strictly sequential: the next one starts `interval` after the
/// previous one finished, so a slow service never sees overlapping requests
/// for the same job. A failed query ends polling without retry.
#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn StatusSource>,
    interval: Duration,
}

impl JobPoller {
    pub fn new(source: Arc<dyn StatusSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Spawns the polling loop on the current tokio runtime.
    pub fn start(
        &self,
        generation: Generation,
        job_id: String,
        sink: Arc<dyn EventSink>,
    ) -> PollerHandle {
        self.start_with_token(generation, job_id, sink, CancellationToken::new())
    }

    pub fn start_with_token(
        &self,
        generation: Generation,
        job_id: String,
        sink: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> PollerHandle {
        let poller = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            poller
                .run(generation, &job_id, sink.as_ref(), &token)
                .await
        });
        PollerHandle { cancel, task }
    }

    pub async fn run(
        &self,
        generation: Generation,
        job_id: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> PollExit {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return PollExit::Stopped,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return PollExit::Stopped,
                outcome = self.source.query(job_id) => outcome,
            };
            // A stop that raced the query wins; nothing is delivered after it.
            if cancel.is_cancelled() {
                return PollExit::Stopped;
            }

            match outcome {
                Ok(report) => {
                    let terminal = report.phase.is_terminal();
                    dub_debug!(
                        "Job {} generation {} status {:?} {}%",
                        job_id,
                        generation,
                        report.phase,
                        report.progress
                    );
                    sink.emit(EngineEvent::StatusReported { generation, report });
                    if terminal {
                        return PollExit::Finished;
                    }
                }
                Err(error) => {
                    dub_warn!("Polling job {} stopped after failed query: {}", job_id, error);
                    sink.emit(EngineEvent::StatusFailed { generation, error });
                    return PollExit::QueryFailed;
                }
            }
        }
    }
}

pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollExit>,
}

impl PollerHandle {
    /// Cancels any pending query. Safe to call repeatedly or after the loop ended.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.task.is_finished()
    }

    /// Waits for the loop to end. `None` if the task panicked.
    pub async fn join(self) -> Option<PollExit> {
        self.task.await.ok()
    }
}
