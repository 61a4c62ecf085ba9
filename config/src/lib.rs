//! Configuration loading for the fortune calculator.
//!
//! ```toml
//! [app]
//! ascii_only = false
//! high_contrast = false
//!
//! [engine]
//! kind = "table"      # "sample" (default) or "table"
//! timeout_ms = 5000
//! delay_ms = 0
//!
//! [form]
//! name = "张三"
//! birthdate = "1990-01-01"
//!
//! [ratings.good]
//! label = "Good"
//! tone = "emerald"
//! description = "A fine day for most things"
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use fortune_types::parse_birthdate;
use fortune_types::settings::{
    EngineKind, EngineSettings, FormDefaults, RatingOverride, UiOptions,
};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "FORTUNE_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct FortuneConfig {
    app: Option<AppConfig>,
    engine: Option<EngineConfig>,
    form: Option<FormConfig>,
    #[serde(default)]
    ratings: BTreeMap<String, RatingConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    high_contrast: bool,
}

#[derive(Debug, Default, Deserialize)]
struct EngineConfig {
    kind: Option<String>,
    timeout_ms: Option<u64>,
    delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FormConfig {
    name: Option<String>,
    birthdate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RatingConfig {
    label: Option<String>,
    tone: Option<String>,
    description: Option<String>,
}

impl FortuneConfig {
    /// Load the config file. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app.as_ref().map_or_else(UiOptions::default, |app| UiOptions {
            ascii_only: app.ascii_only,
            high_contrast: app.high_contrast,
        })
    }

    /// Resolve `[engine]`. Unknown kinds fall back to the default with a warning.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let Some(raw) = self.engine.as_ref() else {
            return defaults;
        };

        let kind = match raw.kind.as_deref() {
            None => defaults.kind,
            Some(value) => EngineKind::parse(value).unwrap_or_else(|| {
                tracing::warn!("Unknown engine kind in config: {}", value);
                defaults.kind
            }),
        };

        let timeout = match raw.timeout_ms {
            Some(0) => {
                tracing::warn!("engine.timeout_ms = 0 would fail every calculation; using default");
                defaults.timeout
            }
            Some(ms) => Duration::from_millis(ms),
            None => defaults.timeout,
        };

        EngineSettings {
            kind,
            timeout,
            delay: raw
                .delay_ms
                .map_or_else(|| kind.default_delay(), Duration::from_millis),
        }
    }

    /// Resolve `[form]`. An unparseable birthdate is dropped with a warning.
    #[must_use]
    pub fn form_defaults(&self) -> FormDefaults {
        let defaults = FormDefaults::default();
        let Some(raw) = self.form.as_ref() else {
            return defaults;
        };

        let birthdate = match raw.birthdate.as_deref() {
            None => defaults.birthdate,
            Some(value) => match parse_birthdate(value) {
                Ok(date) => Some(date),
                Err(err) => {
                    tracing::warn!("Ignoring form.birthdate in config: {}", err);
                    defaults.birthdate
                }
            },
        };

        FormDefaults {
            name: raw.name.clone().unwrap_or(defaults.name),
            birthdate,
        }
    }

    /// Raw `[ratings.*]` tables; validated when the rating profile is built.
    #[must_use]
    pub fn rating_overrides(&self) -> BTreeMap<String, RatingOverride> {
        self.ratings
            .iter()
            .map(|(key, raw)| {
                (
                    key.clone(),
                    RatingOverride {
                        label: raw.label.clone(),
                        tone: raw.tone.clone(),
                        description: raw.description.clone(),
                    },
                )
            })
            .collect()
    }
}

/// `~/.fortune`, home of the config file and logs.
#[must_use]
pub fn fortune_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".fortune"))
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var(CONFIG_PATH_ENV)
        && !custom.trim().is_empty()
    {
        return Some(PathBuf::from(custom));
    }
    fortune_dir().map(|dir| dir.join("config.toml"))
}
