use crate::state::Released;
use crate::{validate, AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            let asset = match validate(&file, &state.settings().limits) {
                Ok(asset) => asset,
                Err(err) => {
                    state.reject_selection(err.to_string());
                    return (state, Vec::new());
                }
            };

            // Previous generation goes first so nothing from it can outlive the new one.
            let mut effects = release_effects(state.release_current());
            let (generation, preview) = state.begin_upload(&asset);
            effects.push(Effect::AcquirePreview {
                preview,
                path: asset.path.clone(),
            });
            effects.push(Effect::StartUpload {
                generation,
                path: asset.path,
                content_type: asset.content_type,
            });
            effects
        }
        Msg::UploadProgress {
            generation,
            percent,
        } => {
            state.apply_upload_progress(generation, percent);
            Vec::new()
        }
        Msg::UploadAccepted { generation, job_id } => state
            .accept_upload(generation, job_id)
            .map(|job_id| vec![Effect::StartPolling { generation, job_id }])
            .unwrap_or_default(),
        Msg::UploadFailed { generation, reason } => state
            .fail_upload(generation, reason)
            .map(release_effects)
            .unwrap_or_default(),
        Msg::StatusReported {
            generation,
            phase,
            progress,
            error,
        } => stop_effects(state.apply_status(generation, phase, progress, error)),
        Msg::StatusCheckFailed { generation } => stop_effects(state.fail_status_check(generation)),
        Msg::Reset => release_effects(state.reset()),
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn release_effects(released: Released) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(generation) = released.activity {
        effects.push(Effect::CancelActivity { generation });
    }
    if let Some(preview) = released.preview {
        effects.push(Effect::ReleasePreview { preview });
    }
    effects
}

fn stop_effects(stopped: Option<crate::Generation>) -> Vec<Effect> {
    stopped
        .map(|generation| vec![Effect::CancelActivity { generation }])
        .unwrap_or_default()
}
