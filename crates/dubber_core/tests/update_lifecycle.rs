use std::path::PathBuf;
use std::sync::Once;

use dubber_core::{
    update, AppState, CandidateFile, ControllerSettings, Effect, Generation, Msg, Phase,
    PreviewId, PreviewPolicy, ReportedPhase,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(dubber_logging::initialize_for_tests);
}

fn select_mp4(state: AppState) -> (AppState, Generation) {
    let (state, _) = update(
        state,
        Msg::FileSelected(CandidateFile {
            path: PathBuf::from("clip.mp4"),
            size: 10 * 1024 * 1024,
            content_type: Some("video/mp4".to_string()),
        }),
    );
    let generation = state.generation();
    (state, generation)
}

fn tick(state: AppState, generation: Generation, phase: Phase, progress: u8) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Known(phase),
            progress,
            error: None,
        },
    )
}

fn polling_job(job_id: &str) -> (AppState, Generation) {
    let (state, generation) = select_mp4(AppState::new());
    let (state, _) = update(
        state,
        Msg::UploadAccepted {
            generation,
            job_id: job_id.to_string(),
        },
    );
    (state, generation)
}

#[test]
fn upload_progress_updates_only_the_percentage() {
    init_logging();
    let (state, generation) = select_mp4(AppState::new());

    let (mut state, effects) = update(state, Msg::UploadProgress { generation, percent: 42 });
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Uploading);
    assert_eq!(state.view().progress, 42);
    assert!(state.consume_dirty());

    // Repeated values are accepted but do not request a render.
    let (mut state, _) = update(state, Msg::UploadProgress { generation, percent: 42 });
    assert!(!state.consume_dirty());
}

#[test]
fn full_pipeline_reaches_completed_with_result_locator() {
    init_logging();
    let (state, generation) = select_mp4(AppState::new());
    let (state, _) = update(state, Msg::UploadProgress { generation, percent: 100 });

    let (state, effects) = update(
        state,
        Msg::UploadAccepted {
            generation,
            job_id: "job-1".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            generation,
            job_id: "job-1".to_string(),
        }]
    );
    assert_eq!(state.view().phase, Phase::Transcribing);
    assert_eq!(state.view().progress, 0);
    assert_eq!(state.view().job_id.as_deref(), Some("job-1"));

    let mut state = state;
    for (phase, progress) in [
        (Phase::Transcribing, 10),
        (Phase::Converting, 30),
        (Phase::Synthesizing, 60),
        (Phase::Merging, 80),
    ] {
        let (next, effects) = tick(state, generation, phase, progress);
        assert!(effects.is_empty());
        assert_eq!(next.view().phase, phase);
        assert_eq!(next.view().progress, progress);
        assert_eq!(next.view().result_locator, None);
        state = next;
    }

    let (state, effects) = tick(state, generation, Phase::Completed, 100);
    let view = state.view();
    assert_eq!(effects, vec![Effect::CancelActivity { generation }]);
    assert_eq!(view.phase, Phase::Completed);
    assert_eq!(view.progress, 100);
    assert_eq!(
        view.result_locator.as_deref(),
        Some("http://localhost:5000/api/result/job-1")
    );
    assert_eq!(view.error_message, None);
    assert!(view.can_reset);
    assert_eq!(view.status_label, "Processing complete");

    // Anything arriving after completion is ignored.
    let (after, effects) = tick(state.clone(), generation, Phase::Merging, 5);
    assert!(effects.is_empty());
    assert_eq!(after, state);
}

#[test]
fn phases_are_assigned_without_ordering_checks() {
    init_logging();
    let (state, generation) = polling_job("job-1");

    let (state, _) = tick(state, generation, Phase::Merging, 90);
    let (state, effects) = tick(state, generation, Phase::Transcribing, 20);

    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Transcribing);
    assert_eq!(state.view().progress, 20);
}

#[test]
fn result_locator_uses_configured_service_base() {
    init_logging();
    let settings = ControllerSettings {
        service_base: "https://dub.example.com/v1/".parse().unwrap(),
        ..ControllerSettings::default()
    };
    let (state, generation) = select_mp4(AppState::with_settings(settings));
    let (state, _) = update(
        state,
        Msg::UploadAccepted {
            generation,
            job_id: "clip.mp4".to_string(),
        },
    );

    let (state, _) = tick(state, generation, Phase::Completed, 100);
    assert_eq!(
        state.view().result_locator.as_deref(),
        Some("https://dub.example.com/v1/api/result/clip.mp4")
    );
}

#[test]
fn upload_success_without_job_id_ends_in_error_without_polling() {
    init_logging();
    let (state, generation) = select_mp4(AppState::new());

    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            generation,
            reason: "server did not return a job identifier".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::CancelActivity { generation }]);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartPolling { .. })));
    let view = state.view();
    assert_eq!(view.phase, Phase::Error);
    assert_eq!(
        view.error_message.as_deref(),
        Some("server did not return a job identifier")
    );
    assert_eq!(view.job_id, None);
    // Default policy keeps the preview playable.
    assert_eq!(view.preview, Some(PreviewId(1)));
    assert!(view.can_reset);
}

#[test]
fn upload_failure_can_release_preview_by_policy() {
    init_logging();
    let settings = ControllerSettings {
        preview_policy: PreviewPolicy::ReleaseOnUploadFailure,
        ..ControllerSettings::default()
    };
    let (state, generation) = select_mp4(AppState::with_settings(settings));

    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            generation,
            reason: "upload failed".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::CancelActivity { generation },
            Effect::ReleasePreview {
                preview: PreviewId(1)
            },
        ]
    );
    assert_eq!(state.view().preview, None);

    // Reset afterwards has nothing left to release.
    let (_state, effects) = update(state, Msg::Reset);
    assert!(effects.is_empty());
}

#[test]
fn failed_status_query_is_terminal() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, _) = tick(state, generation, Phase::Transcribing, 10);

    let (state, effects) = update(state, Msg::StatusCheckFailed { generation });

    assert_eq!(effects, vec![Effect::CancelActivity { generation }]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Error);
    assert_eq!(
        view.error_message.as_deref(),
        Some("an error occurred while checking the processing status")
    );
    assert_eq!(view.job_id.as_deref(), Some("job-1"));

    // Polling never resumes for this job.
    let (after, effects) = tick(state.clone(), generation, Phase::Converting, 40);
    assert!(effects.is_empty());
    assert_eq!(after, state);
}

#[test]
fn remote_error_surfaces_message_or_fallback() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, effects) = update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Known(Phase::Error),
            progress: 0,
            error: Some("speech recognition failed".to_string()),
        },
    );
    assert_eq!(effects, vec![Effect::CancelActivity { generation }]);
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("speech recognition failed")
    );

    let (state, generation) = polling_job("job-2");
    let (state, _) = update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Known(Phase::Error),
            progress: 0,
            error: Some("   ".to_string()),
        },
    );
    assert_eq!(state.view().phase, Phase::Error);
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("unknown processing error")
    );
    assert_eq!(state.view().result_locator, None);
}

#[test]
fn error_text_on_non_error_phase_is_not_exposed() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, _) = update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Known(Phase::Converting),
            progress: 35,
            error: Some("transient warning".to_string()),
        },
    );

    assert_eq!(state.view().phase, Phase::Converting);
    assert_eq!(state.view().error_message, None);
}

#[test]
fn unrecognized_phase_becomes_error() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, effects) = update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Unrecognized("unknown".to_string()),
            progress: 0,
            error: None,
        },
    );

    assert_eq!(effects, vec![Effect::CancelActivity { generation }]);
    assert_eq!(state.view().phase, Phase::Error);
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("unrecognized processing phase 'unknown'")
    );
}

#[test]
fn reported_idle_is_treated_as_unrecognized() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, _) = tick(state, generation, Phase::Idle, 0);

    assert_eq!(state.view().phase, Phase::Error);
    assert_eq!(
        state.view().error_message.as_deref(),
        Some("unrecognized processing phase 'idle'")
    );
}

#[test]
fn working_keeps_phase_and_updates_progress() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, _) = tick(state, generation, Phase::Synthesizing, 50);

    let (state, effects) = update(
        state,
        Msg::StatusReported {
            generation,
            phase: ReportedPhase::Working,
            progress: 60,
            error: None,
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Synthesizing);
    assert_eq!(state.view().progress, 60);
}

#[test]
fn progress_is_clamped_to_one_hundred() {
    init_logging();
    let (state, generation) = polling_job("job-1");
    let (state, _) = tick(state, generation, Phase::Merging, 250);
    assert_eq!(state.view().progress, 100);
}
