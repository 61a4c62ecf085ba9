//! Fortune calculator binary: startup wiring and terminal session management.
//!
//! ```text
//! main() -> config + rating profile + engine -> TerminalSession::new() -> run_app()
//! ```
//!
//! # Event Loop
//!
//! A fixed 16ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`fortune_tui::InputPump`])
//! 3. Apply a finished calculation (`app.tick()`)
//! 4. Render frame

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fortune_config::{FortuneConfig, fortune_dir};
use fortune_engine::{Calculator, RatingProfile, build_engine};
use fortune_tui::{FortuneApp, InputPump, draw, handle_events};

const FRAME_DURATION: Duration = Duration::from_millis(16);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: drop logs rather than draw over the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!("Failed to create log dir {}: {e}", parent.display()));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.fortune/logs/fortune.log
    if let Some(dir) = fortune_dir() {
        candidates.push(dir.join("logs").join("fortune.log"));
    }

    // Fallback: ./.fortune/logs/fortune.log
    candidates.push(PathBuf::from(".fortune").join("logs").join("fortune.log"));

    candidates
}

/// A broken config file is reported and ignored; defaults still work.
fn load_config() -> Option<FortuneConfig> {
    match FortuneConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %err.path().display(), "{err}; using defaults");
            None
        }
    }
}

/// Builtin rating table plus `[ratings.*]` overrides, checked for completeness.
///
/// Errors here are configuration errors and abort startup.
fn build_profile(config: Option<&FortuneConfig>) -> Result<Arc<RatingProfile>> {
    let builtin = RatingProfile::builtin();
    let profile = match config {
        Some(config) => {
            let overrides = config.rating_overrides();
            builtin
                .with_overrides(&overrides)
                .context("invalid [ratings] configuration")?
        }
        None => builtin.clone(),
    };
    profile
        .ensure_complete()
        .context("rating profile is incomplete")?;
    Ok(Arc::new(profile))
}

/// RAII terminal setup: raw mode and the alternate screen, undone on drop even
/// after an early return.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let profile = build_profile(config.as_ref()).inspect_err(|err| {
        tracing::error!("{err:#}");
    })?;
    let settings = config
        .as_ref()
        .map(FortuneConfig::engine_settings)
        .unwrap_or_default();
    let form = config
        .as_ref()
        .map(FortuneConfig::form_defaults)
        .unwrap_or_default();
    let options = config
        .as_ref()
        .map(FortuneConfig::ui_options)
        .unwrap_or_default();

    let engine = build_engine(&settings);
    tracing::info!(
        engine = engine.name(),
        timeout_ms = settings.timeout.as_millis(),
        delay_ms = settings.delay.as_millis(),
        "Fortune calculator starting"
    );

    let calculator = Calculator::new(engine, profile, settings.timeout, &form);
    let mut app = FortuneApp::new(calculator, options);

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };

    if let Err(err) = &result {
        tracing::error!("{err:#}");
    }
    result
}

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut FortuneApp) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        match handle_events(app, &mut input) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        app.tick();

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
