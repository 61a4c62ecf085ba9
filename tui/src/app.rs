//! Presentation state wrapped around the calculator.

use fortune_engine::{Calculator, Phase, SessionEvent, UiOptions};
use fortune_types::BIRTHDATE_DISPLAY_FORMAT;

use crate::field::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Name,
    Birthdate,
}

impl Field {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Name => Self::Birthdate,
            Self::Birthdate => Self::Name,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Birthdate => "Birthdate",
        }
    }
}

/// The calculator plus what only the terminal cares about: field editors,
/// focus, animation tick and the quit flag.
pub struct FortuneApp {
    calculator: Calculator,
    name: TextField,
    birthdate: TextField,
    focus: Field,
    options: UiOptions,
    tick: usize,
    should_quit: bool,
    /// One-line reason the last submit was refused.
    notice: Option<String>,
}

impl FortuneApp {
    #[must_use]
    pub fn new(calculator: Calculator, options: UiOptions) -> Self {
        let name = TextField::with_text(calculator.input().name());
        let birthdate = TextField::with_text(
            calculator
                .input()
                .birthdate()
                .map(|date| date.format(BIRTHDATE_DISPLAY_FORMAT).to_string())
                .unwrap_or_default(),
        );
        Self {
            calculator,
            name,
            birthdate,
            focus: Field::default(),
            options,
            tick: 0,
            should_quit: false,
            notice: None,
        }
    }

    #[must_use]
    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.options
    }

    #[must_use]
    pub fn focus(&self) -> Field {
        self.focus
    }

    #[must_use]
    pub fn field(&self, field: Field) -> &TextField {
        match field {
            Field::Name => &self.name,
            Field::Birthdate => &self.birthdate,
        }
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Apply `edit` to the focused field and push the result into the draft.
    pub fn edit_focused(&mut self, edit: impl FnOnce(&mut TextField)) {
        if self.calculator.phase() != Phase::Idle {
            return;
        }
        self.notice = None;
        match self.focus {
            Field::Name => {
                edit(&mut self.name);
                self.calculator.set_name(self.name.text());
            }
            Field::Birthdate => {
                edit(&mut self.birthdate);
                // Rejections are recorded on the draft and rendered from there.
                if let Err(err) = self.calculator.set_birthdate_text(self.birthdate.text()) {
                    tracing::debug!(%err, "Birthdate flagged");
                }
            }
        }
    }

    pub fn submit(&mut self) {
        match self.calculator.submit() {
            Ok(event) => {
                self.notice = None;
                tracing::debug!(?event, "Submit accepted");
            }
            Err(err) => {
                tracing::debug!(%err, "Submit refused");
                self.notice = Some(err.to_string());
            }
        }
    }

    pub fn reset(&mut self) {
        if let Err(err) = self.calculator.reset() {
            tracing::debug!(%err, "Reset refused");
        }
    }

    /// Advance animation and apply a finished calculation, if any.
    pub fn tick(&mut self) -> Option<SessionEvent> {
        self.tick = self.tick.wrapping_add(1);
        let event = self.calculator.poll();
        if let Some(SessionEvent::Failed(failure)) = &event {
            tracing::warn!(%failure, "Calculation failed");
        }
        event
    }

    #[cfg(test)]
    pub(crate) fn calculator_mut(&mut self) -> &mut Calculator {
        &mut self.calculator
    }
}
