use std::fmt;

/// Identity of one selection's activity, assigned by the controller.
pub type Generation = u64;

pub type PreviewId = u64;

/// Pipeline phase as named by the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePhase {
    Uploading,
    Transcribing,
    Converting,
    Synthesizing,
    Merging,
    Completed,
    Error,
    /// Generic in-progress marker without a stage name.
    Processing,
    Unrecognized(String),
}

impl RemotePhase {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "uploading" => RemotePhase::Uploading,
            "transcribing" => RemotePhase::Transcribing,
            "converting" => RemotePhase::Converting,
            "synthesizing" => RemotePhase::Synthesizing,
            "merging" => RemotePhase::Merging,
            "completed" => RemotePhase::Completed,
            "error" => RemotePhase::Error,
            "processing" => RemotePhase::Processing,
            other => RemotePhase::Unrecognized(other.to_string()),
        }
    }

    /// Polling stops after a terminal report. Unrecognized values end the job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemotePhase::Completed | RemotePhase::Error | RemotePhase::Unrecognized(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub phase: RemotePhase,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAccepted {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadProgress {
        generation: Generation,
        percent: u8,
    },
    UploadFinished {
        generation: Generation,
        result: Result<JobAccepted, ServiceError>,
    },
    StatusReported {
        generation: Generation,
        report: StatusReport,
    },
    StatusFailed {
        generation: Generation,
        error: ServiceError,
    },
}

/// Failure of a call to the processing service. `message` is fit for the
/// user; `kind` is for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The service answered 2xx but broke the response contract.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::MissingJobId | FailureKind::MalformedResponse
        )
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidRequest,
    Io,
    HttpStatus(u16),
    Timeout,
    Network,
    MissingJobId,
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MissingJobId => write!(f, "missing job id"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

pub(crate) fn map_reqwest_error(err: &reqwest::Error, message: &str) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, message);
    }
    if err.is_builder() {
        return ServiceError::new(FailureKind::InvalidRequest, message);
    }
    ServiceError::new(FailureKind::Network, message)
}
