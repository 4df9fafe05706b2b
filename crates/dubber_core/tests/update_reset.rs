use std::path::PathBuf;

use dubber_core::{
    update, AppState, AppViewModel, CandidateFile, Effect, Msg, Phase, PreviewId, ReportedPhase,
};

fn init_logging() {
    dubber_logging::initialize_for_tests();
}

fn completed_job() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::FileSelected(CandidateFile {
            path: PathBuf::from("clip.mp4"),
            size: 4096,
            content_type: Some("video/mp4".to_string()),
        }),
    );
    let (state, _) = update(
        state,
        Msg::UploadAccepted {
            generation: 1,
            job_id: "job-1".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::StatusReported {
            generation: 1,
            phase: ReportedPhase::Known(Phase::Completed),
            progress: 100,
            error: None,
        },
    );
    state
}

fn idle_view(view: &AppViewModel) -> bool {
    view.phase == Phase::Idle
        && view.progress == 0
        && view.job_id.is_none()
        && view.error_message.is_none()
        && view.result_locator.is_none()
        && view.preview.is_none()
        && view.selected_file.is_none()
        && view.notice.is_none()
        && !view.can_reset
}

#[test]
fn reset_from_completed_clears_everything_and_releases_preview() {
    init_logging();
    let state = completed_job();
    assert!(state.view().result_locator.is_some());

    let (mut state, effects) = update(state, Msg::Reset);

    // The poller already stopped on completion; only the preview remains.
    assert_eq!(
        effects,
        vec![Effect::ReleasePreview {
            preview: PreviewId(1)
        }]
    );
    assert!(idle_view(&state.view()));
    assert!(state.consume_dirty());
}

#[test]
fn reset_is_idempotent() {
    init_logging();
    let (state, first) = update(completed_job(), Msg::Reset);
    let (mut state, second) = update(state, Msg::Reset);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert!(idle_view(&state.view()));
    state.consume_dirty();

    let (mut again, third) = update(state.clone(), Msg::Reset);
    assert!(third.is_empty());
    assert_eq!(again, state);
    assert!(!again.consume_dirty());
}

#[test]
fn reset_while_uploading_cancels_activity() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FileSelected(CandidateFile {
            path: PathBuf::from("clip.mov"),
            size: 4096,
            content_type: Some("video/quicktime".to_string()),
        }),
    );

    let (state, effects) = update(state, Msg::Reset);
    assert_eq!(
        effects,
        vec![
            Effect::CancelActivity { generation: 1 },
            Effect::ReleasePreview {
                preview: PreviewId(1)
            },
        ]
    );
    assert!(idle_view(&state.view()));

    // The in-flight upload resolving afterwards is stale.
    let (state, effects) = update(
        state,
        Msg::UploadAccepted {
            generation: 1,
            job_id: "job-late".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(idle_view(&state.view()));
}

#[test]
fn reset_clears_validation_notice() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FileSelected(CandidateFile {
            path: PathBuf::from("song.mp3"),
            size: 10,
            content_type: Some("audio/mpeg".to_string()),
        }),
    );
    assert!(state.view().notice.is_some());

    let (state, effects) = update(state, Msg::Reset);
    assert!(effects.is_empty());
    assert!(idle_view(&state.view()));
}

#[test]
fn selection_after_reset_uses_fresh_generation_and_preview() {
    init_logging();
    let (state, _) = update(completed_job(), Msg::Reset);

    let (state, effects) = update(
        state,
        Msg::FileSelected(CandidateFile {
            path: PathBuf::from("next.mp4"),
            size: 4096,
            content_type: Some("video/mp4".to_string()),
        }),
    );

    assert_eq!(state.generation(), 2);
    assert_eq!(
        effects[0],
        Effect::AcquirePreview {
            preview: PreviewId(2),
            path: PathBuf::from("next.mp4"),
        }
    );
}
