use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use dubber_logging::{dub_debug, dub_warn};
use futures_util::stream::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

use crate::settings::ServiceSettings;
use crate::sink::EventSink;
use crate::types::{map_reqwest_error, FailureKind, ServiceError};
use crate::{EngineEvent, Generation, JobAccepted};

pub const UPLOAD_FAILED_FALLBACK: &str = "upload failed, please try again later";
pub const MISSING_JOB_ID: &str = "server did not return a job identifier";

/// Multipart form field carrying the video.
const VIDEO_FIELD: &str = "video";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub generation: Generation,
    pub path: PathBuf,
    pub content_type: String,
}

#[async_trait::async_trait]
pub trait UploadChannel: Send + Sync {
    /// Sends the file and resolves to the job the service created for it.
    /// Progress is reported through `sink` as `EngineEvent::UploadProgress`.
    async fn upload(
        &self,
        request: &UploadRequest,
        sink: &dyn EventSink,
    ) -> Result<JobAccepted, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestUploadChannel {
    settings: ServiceSettings,
}

impl ReqwestUploadChannel {
    pub fn new(settings: ServiceSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl UploadChannel for ReqwestUploadChannel {
    async fn upload(
        &self,
        request: &UploadRequest,
        sink: &dyn EventSink,
    ) -> Result<JobAccepted, ServiceError> {
        let generation = request.generation;
        let file = tokio::fs::File::open(&request.path).await.map_err(|err| {
            dub_warn!("Upload {} could not open {:?}: {}", generation, request.path, err);
            ServiceError::new(FailureKind::Io, UPLOAD_FAILED_FALLBACK)
        })?;
        let total = file
            .metadata()
            .await
            .map_err(|err| {
                dub_warn!("Upload {} could not stat {:?}: {}", generation, request.path, err);
                ServiceError::new(FailureKind::Io, UPLOAD_FAILED_FALLBACK)
            })?
            .len();
        let file_name = request
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let chunks = ReaderStream::with_capacity(file, self.settings.upload_chunk_size.max(1));
        let body = reqwest::Body::wrap_stream(counted_body(chunks, total, progress_tx));
        let part = Part::stream_with_length(body, total)
            .file_name(file_name)
            .mime_str(&request.content_type)
            .map_err(|err| {
                dub_warn!("Upload {} has bad content type: {}", generation, err);
                ServiceError::new(FailureKind::InvalidRequest, UPLOAD_FAILED_FALLBACK)
            })?;
        let form = Form::new().part(VIDEO_FIELD, part);

        let client = self.settings.build_client(self.settings.upload_timeout)?;
        let send = client
            .post(self.settings.upload_url())
            .multipart(form)
            .send();
        tokio::pin!(send);

        let mut last_percent = None;
        let mut report = |percent: u8| {
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                sink.emit(EngineEvent::UploadProgress {
                    generation,
                    percent,
                });
            }
        };
        let response = loop {
            tokio::select! {
                result = &mut send => break result,
                Some(percent) = progress_rx.recv() => report(percent),
            }
        };
        while let Ok(percent) = progress_rx.try_recv() {
            report(percent);
        }

        let response = response.map_err(|err| {
            dub_warn!("Upload {} transport failure: {}", generation, err);
            map_reqwest_error(&err, UPLOAD_FAILED_FALLBACK)
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            dub_warn!("Upload {} failed reading response: {}", generation, err);
            map_reqwest_error(&err, UPLOAD_FAILED_FALLBACK)
        })?;

        if !status.is_success() {
            let message = server_error_message(&body)
                .unwrap_or_else(|| UPLOAD_FAILED_FALLBACK.to_string());
            dub_warn!("Upload {} rejected with {}: {}", generation, status, message);
            return Err(ServiceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        parse_accepted(&body).inspect_err(|err| {
            dub_warn!(
                "Upload {} protocol violation ({}): success response carried no job id",
                generation,
                err.kind
            );
        })
    }
}

/// Passes chunks through unchanged and reports the share handed to the
/// transport after each one.
fn counted_body<S>(
    chunks: S,
    total: u64,
    progress_tx: mpsc::UnboundedSender<u8>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let mut sent = 0u64;
    chunks.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            let _ = progress_tx.send(upload_percent(sent, total));
        }
        chunk
    })
}

/// Integer percentage of `sent / total`, rounded half up.
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total);
    ((sent * 200 + total) / (total * 2)) as u8
}

fn server_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty())
}

fn parse_accepted(body: &[u8]) -> Result<JobAccepted, ServiceError> {
    let parsed: UploadResponse = serde_json::from_slice(body).map_err(|err| {
        dub_debug!("Upload response is not valid JSON: {}", err);
        ServiceError::new(FailureKind::MalformedResponse, MISSING_JOB_ID)
    })?;
    match parsed.filename {
        Some(job_id) if !job_id.is_empty() => Ok(JobAccepted { job_id }),
        _ => Err(ServiceError::new(FailureKind::MissingJobId, MISSING_JOB_ID)),
    }
}
