//! Resolved configuration types shared across crates.
//!
//! These types represent fully-validated, resolved configuration state.
//! Raw TOML deserialization structs (with `Option` fields) stay private in
//! `fortune-config`. The config loader resolves them into these types at the
//! parse boundary.

use std::time::Duration;

use chrono::NaiveDate;

/// Default cap on a single engine call.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Artificial latency of the sample engine, matching the page's mock.
pub const DEFAULT_SAMPLE_DELAY: Duration = Duration::from_millis(1_500);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
}

/// Which fortune engine implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    /// Fixed sample report after a fixed delay.
    #[default]
    Sample,
    /// Deterministic digest-driven tables.
    Table,
}

impl EngineKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Table => "table",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sample" | "mock" => Some(Self::Sample),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    #[must_use]
    pub const fn default_delay(self) -> Duration {
        match self {
            Self::Sample => DEFAULT_SAMPLE_DELAY,
            Self::Table => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// Upper bound on one engine call; expiry counts as an engine failure.
    pub timeout: Duration,
    pub delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let kind = EngineKind::default();
        Self {
            kind,
            timeout: DEFAULT_ENGINE_TIMEOUT,
            delay: kind.default_delay(),
        }
    }
}

/// Initial contents of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub name: String,
    pub birthdate: Option<NaiveDate>,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            name: String::new(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1),
        }
    }
}

/// Per-rating display overrides as written by the user.
///
/// Keys and tone names are validated when the rating profile is built, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingOverride {
    pub label: Option<String>,
    pub tone: Option<String>,
    pub description: Option<String>,
}
