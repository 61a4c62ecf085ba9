//! Key input for the fortune TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use fortune_engine::Phase;

use crate::app::FortuneApp;

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 256; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close first so a reader blocked on a full channel wakes up.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued input. Returns `true` when the app should quit.
pub fn handle_events(app: &mut FortuneApp, input: &mut InputPump) -> Result<bool> {
    for _ in 0..MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if let Event::Key(key) = ev {
            apply_key(app, key);
        }
        if app.should_quit() {
            return Ok(true);
        }
    }
    Ok(app.should_quit())
}

/// Route one key press according to the session phase.
pub fn apply_key(app: &mut FortuneApp, key: KeyEvent) {
    if matches!(key.kind, KeyEventKind::Release) {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.request_quit();
        return;
    }

    match app.calculator().phase() {
        Phase::Idle => handle_form_key(app, key),
        // Nothing to do until the engine answers.
        Phase::Pending => {}
        Phase::Settled => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('r' | 'R')) {
                app.reset();
            }
        }
    }
}

fn handle_form_key(app: &mut FortuneApp, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.cycle_focus(),
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.edit_focused(|field| field.delete_char()),
        KeyCode::Delete => app.edit_focused(|field| field.delete_char_forward()),
        KeyCode::Left => app.edit_focused(|field| field.move_cursor_left()),
        KeyCode::Right => app.edit_focused(|field| field.move_cursor_right()),
        KeyCode::Home => app.edit_focused(|field| field.move_cursor_home()),
        KeyCode::End => app.edit_focused(|field| field.move_cursor_end()),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_focused(|field| field.enter_char(c));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use fortune_engine::{Calculator, RatingProfile, SampleEngine, ValidationError};
    use fortune_types::settings::FormDefaults;

    use super::*;
    use crate::app::Field;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
    }

    fn app() -> FortuneApp {
        let calculator = Calculator::new(
            Arc::new(SampleEngine::new(Duration::ZERO)),
            Arc::new(RatingProfile::builtin().clone()),
            Duration::from_secs(5),
            &FormDefaults::default(),
        )
        .with_clock(today);
        FortuneApp::new(calculator, fortune_engine::UiOptions::default())
    }

    fn press(app: &mut FortuneApp, code: KeyCode) {
        apply_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut FortuneApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_updates_the_draft() {
        let mut app = app();
        type_text(&mut app, "Ann");
        assert_eq!(app.calculator().input().name(), "Ann");
        assert!(app.calculator().can_submit());

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Field::Birthdate);
        for _ in 0..10 {
            press(&mut app, KeyCode::Backspace);
        }
        assert_eq!(app.field(Field::Birthdate).text(), "");
        assert_eq!(app.calculator().input().birthdate(), None);
        assert!(!app.calculator().can_submit());

        type_text(&mut app, "2030-01-01");
        assert!(matches!(
            app.calculator().input().flag(),
            Some(ValidationError::FutureBirthdate { .. })
        ));
        assert!(!app.calculator().can_submit());
    }

    #[test]
    fn enter_with_incomplete_form_sets_notice() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.calculator().phase(), Phase::Idle);
        assert_eq!(app.notice(), Some("name is required"));

        type_text(&mut app, "A");
        assert_eq!(app.notice(), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut app = app();
        apply_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit());
    }

    #[tokio::test(start_paused = true)]
    async fn settled_keys_reset_and_keep_draft() {
        let mut app = app();
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.calculator().phase(), Phase::Pending);

        // Edits are ignored while pending.
        type_text(&mut app, "x");
        assert_eq!(app.calculator().input().name(), "Ann");

        app.calculator_mut().settle().await.expect("event");
        assert_eq!(app.calculator().phase(), Phase::Settled);

        // 'r' in the report view resets rather than typing.
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.calculator().phase(), Phase::Idle);
        assert_eq!(app.field(Field::Name).text(), "Ann");
    }
}
