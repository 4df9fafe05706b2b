use crate::phase::{Phase, ReportedPhase};
use crate::settings::{ControllerSettings, PreviewPolicy};
use crate::validate::AcceptedAsset;
use crate::view_model::AppViewModel;

/// Opaque job identifier assigned by the processing service.
pub type JobId = String;

/// Identity of one selection's activity. Events tagged with an older
/// generation are stale and never touch the state.
pub type Generation = u64;

/// Handle to a locally held preview of the selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewId(pub u64);

pub(crate) const STATUS_CHECK_FAILED: &str = "an error occurred while checking the processing status";
pub(crate) const REMOTE_ERROR_FALLBACK: &str = "unknown processing error";

/// Resources handed back by the state that the caller must cancel or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Released {
    pub activity: Option<Generation>,
    pub preview: Option<PreviewId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: ControllerSettings,
    phase: Phase,
    generation: Generation,
    /// Upload or polling is live for `generation`.
    active: bool,
    job_id: Option<JobId>,
    progress: u8,
    error_message: Option<String>,
    result_locator: Option<String>,
    selected_file: Option<String>,
    preview: Option<PreviewId>,
    next_preview: u64,
    notice: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ControllerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            status_label: self.phase.label(),
            progress: self.progress,
            job_id: self.job_id.clone(),
            error_message: self.error_message.clone(),
            result_locator: self.result_locator.clone(),
            selected_file: self.selected_file.clone(),
            preview: self.preview,
            notice: self.notice.clone(),
            can_reset: self.phase.is_terminal(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is pending and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.active && generation == self.generation
    }

    pub(crate) fn reject_selection(&mut self, reason: String) {
        self.notice = Some(reason);
        self.dirty = true;
    }

    /// Starts a new upload generation for an accepted asset. The caller must
    /// have released the previous generation first.
    pub(crate) fn begin_upload(&mut self, asset: &AcceptedAsset) -> (Generation, PreviewId) {
        self.generation += 1;
        self.next_preview += 1;
        let preview = PreviewId(self.next_preview);

        self.active = true;
        self.phase = Phase::Uploading;
        self.progress = 0;
        self.job_id = None;
        self.error_message = None;
        self.result_locator = None;
        self.notice = None;
        self.selected_file = asset
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.preview = Some(preview);
        self.dirty = true;
        (self.generation, preview)
    }

    pub(crate) fn apply_upload_progress(&mut self, generation: Generation, percent: u8) {
        if !self.is_current(generation) || self.phase != Phase::Uploading {
            return;
        }
        let percent = percent.min(100);
        if self.progress != percent {
            self.progress = percent;
            self.dirty = true;
        }
    }

    /// Stores the job id and moves to the first remote phase. Returns the job
    /// id to poll, or `None` when the acceptance is stale.
    pub(crate) fn accept_upload(&mut self, generation: Generation, job_id: JobId) -> Option<JobId> {
        if !self.is_current(generation) || self.phase != Phase::Uploading {
            return None;
        }
        self.job_id = Some(job_id.clone());
        self.phase = Phase::FIRST_REMOTE;
        self.progress = 0;
        self.dirty = true;
        Some(job_id)
    }

    pub(crate) fn fail_upload(&mut self, generation: Generation, reason: String) -> Option<Released> {
        if !self.is_current(generation) || self.phase != Phase::Uploading {
            return None;
        }
        self.active = false;
        self.phase = Phase::Error;
        self.error_message = Some(reason);
        self.dirty = true;

        let preview = match self.settings.preview_policy {
            PreviewPolicy::KeepOnUploadFailure => None,
            PreviewPolicy::ReleaseOnUploadFailure => self.preview.take(),
        };
        Some(Released {
            activity: Some(generation),
            preview,
        })
    }

    /// Applies one status tick. Returns the generation to stop when the tick
    /// ended the job.
    pub(crate) fn apply_status(
        &mut self,
        generation: Generation,
        reported: ReportedPhase,
        progress: u8,
        error: Option<String>,
    ) -> Option<Generation> {
        let job_id = self.job_id.clone()?;
        if !self.is_current(generation) || self.phase.is_terminal() {
            return None;
        }

        // Idle is local-only; the service never legitimately reports it.
        let reported = match reported {
            ReportedPhase::Known(Phase::Idle) => {
                ReportedPhase::Unrecognized(Phase::Idle.as_str().to_string())
            }
            other => other,
        };

        self.progress = progress.min(100);
        self.dirty = true;
        match reported {
            ReportedPhase::Known(Phase::Completed) => {
                self.phase = Phase::Completed;
                self.result_locator = Some(self.settings.result_locator(&job_id));
            }
            ReportedPhase::Known(Phase::Error) => {
                let message = error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| REMOTE_ERROR_FALLBACK.to_string());
                self.phase = Phase::Error;
                self.error_message = Some(message);
            }
            ReportedPhase::Known(phase) => {
                self.phase = phase;
            }
            ReportedPhase::Working => {}
            ReportedPhase::Unrecognized(raw) => {
                self.phase = Phase::Error;
                self.error_message = Some(format!("unrecognized processing phase '{raw}'"));
            }
        }

        if self.phase.is_terminal() {
            self.active = false;
            Some(generation)
        } else {
            None
        }
    }

    pub(crate) fn fail_status_check(&mut self, generation: Generation) -> Option<Generation> {
        if !self.is_current(generation) || self.job_id.is_none() || self.phase.is_terminal() {
            return None;
        }
        self.active = false;
        self.phase = Phase::Error;
        self.error_message = Some(STATUS_CHECK_FAILED.to_string());
        self.dirty = true;
        Some(generation)
    }

    /// Hands back everything the current generation holds. Used before a new
    /// selection and on reset.
    pub(crate) fn release_current(&mut self) -> Released {
        let activity = if self.active {
            self.active = false;
            Some(self.generation)
        } else {
            None
        };
        Released {
            activity,
            preview: self.preview.take(),
        }
    }

    /// Returns to idle. The generation counter survives so that events from
    /// before the reset stay stale.
    pub(crate) fn reset(&mut self) -> Released {
        let released = self.release_current();
        let idle = Self {
            settings: self.settings.clone(),
            generation: self.generation,
            next_preview: self.next_preview,
            ..Self::default()
        };
        let was_dirty = std::mem::take(&mut self.dirty);
        let changed = released != Released::default() || *self != idle;
        *self = Self {
            dirty: was_dirty || changed,
            ..idle
        };
        released
    }
}
