use crate::{CandidateFile, Generation, JobId, ReportedPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file to dub.
    FileSelected(CandidateFile),
    /// Upload byte progress, already rounded to a percentage.
    UploadProgress { generation: Generation, percent: u8 },
    /// The service accepted the upload and assigned a job id.
    UploadAccepted { generation: Generation, job_id: JobId },
    /// Transport failure, non-2xx response, or a success response without a job id.
    UploadFailed { generation: Generation, reason: String },
    /// One status query answered.
    StatusReported {
        generation: Generation,
        phase: ReportedPhase,
        progress: u8,
        error: Option<String>,
    },
    /// A status query itself failed; the job is not polled again.
    StatusCheckFailed { generation: Generation },
    /// User clicked reset, or the controller is being torn down.
    Reset,
    /// UI/render tick to coalesce rendering.
    Tick,
}
