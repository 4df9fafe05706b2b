use std::path::PathBuf;

use crate::{Generation, JobId, PreviewId};

/// Side effects requested by `update`, executed by the platform layer in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load a local, playable copy of the selected file.
    AcquirePreview { preview: PreviewId, path: PathBuf },
    ReleasePreview { preview: PreviewId },
    StartUpload {
        generation: Generation,
        path: PathBuf,
        content_type: String,
    },
    StartPolling { generation: Generation, job_id: JobId },
    /// Stop any upload or poller still running for `generation`. Idempotent.
    CancelActivity { generation: Generation },
}
