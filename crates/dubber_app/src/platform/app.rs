use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use dubber_core::{update, AppState, AppViewModel, Msg, Phase};
use dubber_logging::{dub_info, dub_warn, LogDestination};
use log::LevelFilter;

use super::cli::{Cli, LogTarget};
use super::effects::EffectRunner;
use super::files::candidate_from_path;
use super::render::status_line;
use super::settings::AppSettings;

const EVENT_WAIT: Duration = Duration::from_millis(100);

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = AppSettings::load(cli.config.as_deref())?;

    let destination = match cli.log {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File(settings.log_file.clone()),
        LogTarget::Both => LogDestination::Both(settings.log_file.clone()),
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    dubber_logging::initialize(&destination, level);
    match &settings.source {
        Some(path) => dub_info!("Loaded settings from {:?}", path),
        None => dub_info!("No settings file, using defaults"),
    }

    let base = settings.base_url(cli.base_url.as_deref())?;
    dub_info!("Using processing service at {}", base);
    let candidate = candidate_from_path(&cli.video)
        .with_context(|| format!("cannot use {}", cli.video.display()))?;

    let mut session = Session::new(
        AppState::with_settings(settings.controller_settings(base.clone())),
        EffectRunner::new(settings.service_settings(base)),
    );
    session.dispatch(Msg::FileSelected(candidate));
    let outcome = session.run_until_settled();
    session.teardown();

    let view = outcome?;
    if let Some(notice) = view.notice {
        bail!(notice);
    }
    match view.phase {
        Phase::Completed => {
            if let Some(locator) = view.result_locator {
                println!("{locator}");
            }
            Ok(())
        }
        _ => bail!(view
            .error_message
            .unwrap_or_else(|| view.status_label.to_string())),
    }
}

/// Drives one selection through the state machine until it settles.
struct Session {
    state: AppState,
    runner: EffectRunner,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);

        if self.state.consume_dirty() {
            if let Some(line) = status_line(&self.state.view()) {
                println!("{line}");
            }
        }
    }

    /// Returns the view once the job reached a terminal phase or the selection
    /// was rejected.
    fn run_until_settled(&mut self) -> anyhow::Result<AppViewModel> {
        loop {
            let view = self.state.view();
            if view.notice.is_some() {
                dub_warn!("Selection rejected: {}", view.notice.as_deref().unwrap_or_default());
                return Ok(view);
            }
            if view.phase.is_terminal() {
                return Ok(view);
            }

            match self.runner.next_msg(EVENT_WAIT)? {
                Some(msg) => self.dispatch(msg),
                None => self.dispatch(Msg::Tick),
            }
        }
    }

    /// Releases the preview and stops any activity still owned by the session.
    fn teardown(&mut self) {
        self.dispatch(Msg::Reset);
        let leaked = self.runner.release_previews();
        if leaked > 0 {
            dub_warn!("{} previews still live after reset", leaked);
        }
    }
}
