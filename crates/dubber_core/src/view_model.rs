use crate::{JobId, Phase, PreviewId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub status_label: &'static str,
    pub progress: u8,
    pub job_id: Option<JobId>,
    pub error_message: Option<String>,
    pub result_locator: Option<String>,
    pub selected_file: Option<String>,
    pub preview: Option<PreviewId>,
    /// Validation rejection shown next to the picker; never a phase change.
    pub notice: Option<String>,
    /// Reset is offered to the user only once the job is finished.
    pub can_reset: bool,
    pub dirty: bool,
}
