//! User-supplied identity and its validation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::NonEmptyString;

/// Canonical birthdate rendering used in report headers and config files.
pub const BIRTHDATE_DISPLAY_FORMAT: &str = "%Y-%m-%d";

/// Accepted birthdate spellings, tried in order.
const BIRTHDATE_INPUT_FORMATS: [&str; 3] = [BIRTHDATE_DISPLAY_FORMAT, "%Y/%m/%d", "%Y年%m月%d日"];

/// User-correctable input problems. Never fatal; they disable submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    MissingName,
    #[error("birthdate is required")]
    MissingBirthdate,
    #[error("birthdate {input:?} is not a valid date (expected YYYY-MM-DD)")]
    InvalidBirthdate { input: String },
    #[error("birthdate {date} is in the future")]
    FutureBirthdate { date: NaiveDate },
}

/// Parse a birthdate typed by the user.
pub fn parse_birthdate(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    BIRTHDATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidBirthdate {
            input: trimmed.to_string(),
        })
}

/// Reject dates strictly after `today`. There is no lower bound.
pub fn check_birthdate(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date > today {
        Err(ValidationError::FutureBirthdate { date })
    } else {
        Ok(date)
    }
}

/// A validated `(name, birthdate)` pair, immutable once submitted.
///
/// The name is trimmed; whitespace-only names never get this far. The only
/// way in is [`Identity::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    name: NonEmptyString,
    birthdate: NaiveDate,
}

impl Identity {
    pub fn new(name: &str, birthdate: NaiveDate, today: NaiveDate) -> Result<Self, ValidationError> {
        let name = NonEmptyString::trimmed(name).map_err(|_| ValidationError::MissingName)?;
        let birthdate = check_birthdate(birthdate, today)?;
        Ok(Self { name, birthdate })
    }

    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    #[must_use]
    pub fn birthdate(&self) -> NaiveDate {
        self.birthdate
    }

    #[must_use]
    pub fn display_birthdate(&self) -> String {
        self.birthdate.format(BIRTHDATE_DISPLAY_FORMAT).to_string()
    }
}
