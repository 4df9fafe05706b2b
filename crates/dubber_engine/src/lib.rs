//! Dubber engine: upload, status polling and preview IO.
mod engine;
mod poller;
mod preview;
mod settings;
mod sink;
mod status;
mod types;
mod upload;

pub use engine::{EngineHandle, EngineStopped};
pub use poller::{JobPoller, PollExit, PollerHandle};
pub use preview::{PreviewError, PreviewResource, PreviewStore};
pub use settings::{ServiceSettings, DEFAULT_BASE_URL};
pub use sink::{ChannelEventSink, EventSink};
pub use status::{ReqwestStatusSource, StatusSource};
pub use types::{
    EngineEvent, FailureKind, Generation, JobAccepted, PreviewId, RemotePhase, ServiceError,
    StatusReport,
};
pub use upload::{
    upload_percent, ReqwestUploadChannel, UploadChannel, UploadRequest, MISSING_JOB_ID,
    UPLOAD_FAILED_FALLBACK,
};
