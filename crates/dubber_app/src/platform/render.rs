use dubber_core::{AppViewModel, Phase};

const BAR_WIDTH: usize = 30;

/// One terminal line describing the view, or `None` when there is nothing to show.
pub fn status_line(view: &AppViewModel) -> Option<String> {
    if let Some(notice) = &view.notice {
        return Some(format!("Rejected: {notice}"));
    }
    match view.phase {
        Phase::Idle => None,
        Phase::Completed => Some(match &view.result_locator {
            Some(locator) => format!("{}: {}", view.status_label, locator),
            None => view.status_label.to_string(),
        }),
        Phase::Error => Some(format!(
            "{}: {}",
            view.status_label,
            view.error_message.as_deref().unwrap_or("unknown error")
        )),
        _ => Some(format!(
            "[{}] {:>3}% {}",
            progress_bar(view.progress),
            view.progress.min(100),
            view.status_label
        )),
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
