use std::time::Duration;

use dubber_core::{Effect, Msg, Phase, ReportedPhase};
use dubber_engine::{
    EngineEvent, EngineHandle, EngineStopped, PreviewStore, RemotePhase, ServiceSettings,
    UploadRequest,
};
use dubber_logging::{dub_debug, dub_info, dub_warn};

/// Executes core effects against the engine and the preview store, and turns
/// engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    previews: PreviewStore,
}

impl EffectRunner {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            engine: EngineHandle::new(settings),
            previews: PreviewStore::new(),
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AcquirePreview { preview, path } => {
                    match self.previews.acquire(preview.0, &path) {
                        Ok(resource) => {
                            dub_debug!("Preview {} holds {} bytes", preview.0, resource.len())
                        }
                        // The preview is local only; the upload goes ahead without it.
                        Err(err) => dub_warn!("Preview {} unavailable: {}", preview.0, err),
                    }
                }
                Effect::ReleasePreview { preview } => {
                    if self.previews.release(preview.0) {
                        dub_debug!("Preview {} released", preview.0);
                    }
                }
                Effect::StartUpload {
                    generation,
                    path,
                    content_type,
                } => {
                    dub_info!(
                        "StartUpload generation={} path={:?} content_type={}",
                        generation,
                        path,
                        content_type
                    );
                    self.engine.upload(UploadRequest {
                        generation,
                        path,
                        content_type,
                    });
                }
                Effect::StartPolling { generation, job_id } => {
                    dub_info!("StartPolling generation={} job_id={}", generation, job_id);
                    self.engine.poll(generation, job_id);
                }
                Effect::CancelActivity { generation } => {
                    self.engine.cancel(generation);
                }
            }
        }
    }

    /// Next message from the engine, or `None` if nothing arrived in `timeout`.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }

    /// Drops whatever previews are still held. Returns how many there were.
    pub fn release_previews(&mut self) -> usize {
        self.previews.release_all()
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadProgress {
            generation,
            percent,
        } => Msg::UploadProgress {
            generation,
            percent,
        },
        EngineEvent::UploadFinished { generation, result } => match result {
            Ok(accepted) => {
                dub_info!(
                    "Upload generation={} accepted as job {}",
                    generation,
                    accepted.job_id
                );
                Msg::UploadAccepted {
                    generation,
                    job_id: accepted.job_id,
                }
            }
            Err(err) => {
                if err.is_protocol_violation() {
                    dub_warn!("Upload generation={} protocol violation: {}", generation, err);
                } else {
                    dub_warn!("Upload generation={} failed: {}", generation, err);
                }
                Msg::UploadFailed {
                    generation,
                    reason: err.message,
                }
            }
        },
        EngineEvent::StatusReported { generation, report } => {
            match &report.phase {
                RemotePhase::Error => dub_warn!(
                    "Job generation={} failed remotely: {}",
                    generation,
                    report.error.as_deref().unwrap_or("<no message>")
                ),
                RemotePhase::Unrecognized(raw) => {
                    dub_warn!("Job generation={} reported unknown phase {:?}", generation, raw)
                }
                _ => {}
            }
            Msg::StatusReported {
                generation,
                phase: map_phase(report.phase),
                progress: report.progress,
                error: report.error,
            }
        }
        EngineEvent::StatusFailed { generation, error } => {
            dub_warn!("Status check generation={} failed: {}", generation, error);
            Msg::StatusCheckFailed { generation }
        }
    }
}

fn map_phase(phase: RemotePhase) -> ReportedPhase {
    match phase {
        RemotePhase::Uploading => ReportedPhase::Known(Phase::Uploading),
        RemotePhase::Transcribing => ReportedPhase::Known(Phase::Transcribing),
        RemotePhase::Converting => ReportedPhase::Known(Phase::Converting),
        RemotePhase::Synthesizing => ReportedPhase::Known(Phase::Synthesizing),
        RemotePhase::Merging => ReportedPhase::Known(Phase::Merging),
        RemotePhase::Completed => ReportedPhase::Known(Phase::Completed),
        RemotePhase::Error => ReportedPhase::Known(Phase::Error),
        RemotePhase::Processing => ReportedPhase::Working,
        RemotePhase::Unrecognized(raw) => ReportedPhase::Unrecognized(raw),
    }
}
