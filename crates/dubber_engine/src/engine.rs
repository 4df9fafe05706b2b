use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dubber_logging::{dub_debug, dub_error};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::poller::JobPoller;
use crate::settings::ServiceSettings;
use crate::sink::{ChannelEventSink, EventSink};
use crate::status::{ReqwestStatusSource, StatusSource};
use crate::upload::{ReqwestUploadChannel, UploadChannel, UploadRequest};
use crate::{EngineEvent, Generation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread has stopped")]
pub struct EngineStopped;

enum EngineCommand {
    Upload(UploadRequest),
    Poll { generation: Generation, job_id: String },
    Cancel { generation: Generation },
}

/// Runs uploads and pollers on a background tokio runtime.
///
/// Every activity belongs to a generation; cancelling a generation stops its
/// upload or poller before any further event is emitted for it.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ServiceSettings) -> Self {
        let poll_interval = settings.poll_interval;
        Self::with_backends(
            Arc::new(ReqwestUploadChannel::new(settings.clone())),
            Arc::new(ReqwestStatusSource::new(settings)),
            poll_interval,
        )
    }

    pub fn with_backends(
        uploader: Arc<dyn UploadChannel>,
        status: Arc<dyn StatusSource>,
        poll_interval: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let poller = JobPoller::new(status, poll_interval);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    dub_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let _guard = runtime.enter();
            let mut active: HashMap<Generation, CancellationToken> = HashMap::new();

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Upload(request) => {
                        let token = active.entry(request.generation).or_default().clone();
                        let uploader = uploader.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            run_upload(uploader.as_ref(), request, &sink, token).await;
                        });
                    }
                    EngineCommand::Poll { generation, job_id } => {
                        let token = active.entry(generation).or_default().child_token();
                        let sink: Arc<dyn EventSink> =
                            Arc::new(ChannelEventSink::new(event_tx.clone()));
                        poller.start_with_token(generation, job_id, sink, token);
                    }
                    EngineCommand::Cancel { generation } => {
                        if let Some(token) = active.remove(&generation) {
                            dub_debug!("Cancelling activity for generation {}", generation);
                            token.cancel();
                        }
                    }
                }
            }

            for (_, token) in active.drain() {
                token.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn upload(&self, request: UploadRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Upload(request));
    }

    pub fn poll(&self, generation: Generation, job_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Poll {
            generation,
            job_id: job_id.into(),
        });
    }

    /// Stops the upload or poller of `generation`. Idempotent.
    pub fn cancel(&self, generation: Generation) {
        let _ = self.cmd_tx.send(EngineCommand::Cancel { generation });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. Fails once the engine thread
    /// is gone and no event can arrive any more.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }
}

async fn run_upload(
    uploader: &dyn UploadChannel,
    request: UploadRequest,
    sink: &dyn EventSink,
    cancel: CancellationToken,
) {
    let generation = request.generation;
    tokio::select! {
        _ = cancel.cancelled() => {
            dub_debug!("Upload for generation {} cancelled", generation);
        }
        result = uploader.upload(&request, sink) => {
            if !cancel.is_cancelled() {
                sink.emit(EngineEvent::UploadFinished { generation, result });
            }
        }
    }
}
