//! Color theme and glyphs for the fortune TUI.
//!
//! Uses the Kanagawa Wave palette for chrome. Rating tones use their own
//! fixed colors so a badge reads the same regardless of the chrome palette.

use ratatui::style::{Color, Modifier, Style};

use fortune_core::Tone;
use fortune_types::settings::UiOptions;

mod colors {
    use super::Color;

    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147); // oldWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray
    pub const TEXT_DISABLED: Color = Color::Rgb(84, 84, 109); // sumiInk6

    pub const PRIMARY: Color = Color::Rgb(149, 127, 184); // oniViolet
    pub const ACCENT: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const SUCCESS: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const WARNING: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ERROR: Color = Color::Rgb(255, 93, 98); // peachRed
    pub const PEACH: Color = Color::Rgb(255, 160, 102); // surimiOrange

    // Rating tones
    pub const TONE_GREEN: Color = Color::Rgb(34, 197, 94);
    pub const TONE_EMERALD: Color = Color::Rgb(52, 211, 153);
    pub const TONE_BLUE: Color = Color::Rgb(96, 165, 250);
    pub const TONE_ORANGE: Color = Color::Rgb(251, 146, 60);
    pub const TONE_RED: Color = Color::Rgb(239, 68, 68);
}

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub text_disabled: Color,
    pub primary: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub peach: Color,
    pub tone_green: Color,
    pub tone_emerald: Color,
    pub tone_blue: Color,
    pub tone_orange: Color,
    pub tone_red: Color,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            text_disabled: colors::TEXT_DISABLED,
            primary: colors::PRIMARY,
            accent: colors::ACCENT,
            success: colors::SUCCESS,
            warning: colors::WARNING,
            error: colors::ERROR,
            peach: colors::PEACH,
            tone_green: colors::TONE_GREEN,
            tone_emerald: colors::TONE_EMERALD,
            tone_blue: colors::TONE_BLUE,
            tone_orange: colors::TONE_ORANGE,
            tone_red: colors::TONE_RED,
        }
    }

    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::Gray,
            text_disabled: Color::DarkGray,
            primary: Color::White,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            peach: Color::Yellow,
            tone_green: Color::Green,
            tone_emerald: Color::LightGreen,
            tone_blue: Color::LightBlue,
            tone_orange: Color::Yellow,
            tone_red: Color::LightRed,
        }
    }

    #[must_use]
    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Green => self.tone_green,
            Tone::Emerald => self.tone_emerald,
            Tone::Blue => self.tone_blue,
            Tone::Orange => self.tone_orange,
            Tone::Red => self.tone_red,
        }
    }
}

#[must_use]
pub fn palette(options: UiOptions) -> Palette {
    if options.high_contrast {
        Palette::high_contrast()
    } else {
        Palette::standard()
    }
}

/// ASCII/Unicode glyphs for icons and spinners.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub focus: &'static str,
    pub check: &'static str,
    pub cross: &'static str,
    pub warning: &'static str,
    pub separator: &'static str,
    pub spinner_frames: &'static [&'static str],
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\"];

#[must_use]
pub fn glyphs(options: UiOptions) -> Glyphs {
    if options.ascii_only {
        Glyphs {
            focus: ">",
            check: "+",
            cross: "x",
            warning: "!",
            separator: "-",
            spinner_frames: SPINNER_FRAMES_ASCII,
        }
    } else {
        Glyphs {
            focus: "▸",
            check: "✓",
            cross: "✗",
            warning: "⚠",
            separator: "─",
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

#[must_use]
pub fn spinner_frame(tick: usize, options: UiOptions) -> &'static str {
    let frames = glyphs(options).spinner_frames;
    frames[tick % frames.len()]
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn title(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn field_label(palette: &Palette, focused: bool) -> Style {
        if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text_secondary)
        }
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.peach)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_disabled(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.text_disabled)
            .add_modifier(Modifier::DIM)
    }
}
