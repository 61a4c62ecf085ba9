//! Form draft owned by the calculator until submission.

use chrono::NaiveDate;

use fortune_types::settings::FormDefaults;
use fortune_types::{Identity, ValidationError, check_birthdate, parse_birthdate};

/// Mutable `(name, birthdate)` draft.
///
/// Name edits are never validated eagerly. Birthdate edits are: a future date
/// or unparseable text raises a flag that blocks submission until the next
/// accepted edit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputCollector {
    name: String,
    birthdate: Option<NaiveDate>,
    flag: Option<ValidationError>,
}

impl InputCollector {
    #[must_use]
    pub fn new(defaults: &FormDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            birthdate: defaults.birthdate,
            flag: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn birthdate(&self) -> Option<NaiveDate> {
        self.birthdate
    }

    /// The pending birthdate problem, if the last edit was rejected.
    #[must_use]
    pub fn flag(&self) -> Option<&ValidationError> {
        self.flag.as_ref()
    }

    pub fn set_name(&mut self, text: impl Into<String>) {
        self.name = text.into();
    }

    /// Replace the draft birthdate. Future dates leave the draft unchanged.
    pub fn set_birthdate(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
        match check_birthdate(date, today) {
            Ok(date) => {
                self.birthdate = Some(date);
                self.flag = None;
                Ok(())
            }
            Err(err) => {
                tracing::debug!(%err, "Rejected birthdate edit");
                self.flag = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Parse and apply birthdate text as typed into the form.
    ///
    /// Blank text clears the birthdate. Unparseable text clears it and raises
    /// a flag.
    pub fn set_birthdate_text(&mut self, raw: &str, today: NaiveDate) -> Result<(), ValidationError> {
        if raw.trim().is_empty() {
            self.clear_birthdate();
            return Ok(());
        }
        match parse_birthdate(raw) {
            Ok(date) => self.set_birthdate(date, today),
            Err(err) => {
                self.birthdate = None;
                self.flag = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn clear_birthdate(&mut self) {
        self.birthdate = None;
        self.flag = None;
    }

    /// Build the identity that would be submitted right now.
    pub fn validate(&self, today: NaiveDate) -> Result<Identity, ValidationError> {
        if let Some(flag) = &self.flag {
            return Err(flag.clone());
        }
        let birthdate = self.birthdate.ok_or(ValidationError::MissingBirthdate)?;
        Identity::new(&self.name, birthdate, today)
    }

    #[must_use]
    pub fn is_complete(&self, today: NaiveDate) -> bool {
        self.validate(today).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn today() -> NaiveDate {
        day(2024, 6, 1)
    }

    fn filled(name: &str) -> InputCollector {
        let mut input = InputCollector::default();
        input.set_name(name);
        input.set_birthdate(day(1990, 1, 1), today()).expect("past date");
        input
    }

    #[test]
    fn starts_from_form_defaults() {
        let input = InputCollector::new(&FormDefaults::default());
        assert_eq!(input.name(), "");
        assert_eq!(input.birthdate(), Some(day(1990, 1, 1)));
        assert_eq!(input.validate(today()), Err(ValidationError::MissingName));
    }

    #[test]
    fn complete_draft_validates_to_trimmed_identity() {
        let identity = filled("  张三 ").validate(today()).expect("valid");
        assert_eq!(identity.name().as_str(), "张三");
        assert_eq!(identity.birthdate(), day(1990, 1, 1));
    }

    #[test]
    fn whitespace_name_is_missing() {
        assert_eq!(filled("   ").validate(today()), Err(ValidationError::MissingName));
        assert!(!filled("").is_complete(today()));
    }

    #[test]
    fn missing_birthdate_blocks() {
        let mut input = InputCollector::default();
        input.set_name("a");
        assert_eq!(input.validate(today()), Err(ValidationError::MissingBirthdate));
    }

    #[test]
    fn today_is_accepted_tomorrow_is_not() {
        let mut input = filled("a");
        input.set_birthdate(today(), today()).expect("today is allowed");

        let tomorrow = day(2024, 6, 2);
        let err = input.set_birthdate(tomorrow, today()).expect_err("future");
        assert_eq!(err, ValidationError::FutureBirthdate { date: tomorrow });
        // Draft keeps the last accepted date, but submission stays blocked.
        assert_eq!(input.birthdate(), Some(today()));
        assert_eq!(input.flag(), Some(&err));
        assert!(!input.is_complete(today()));

        input.set_birthdate(day(2000, 2, 29), today()).expect("past");
        assert!(input.flag().is_none());
        assert!(input.is_complete(today()));
    }

    #[test]
    fn very_old_dates_are_accepted() {
        let mut input = filled("a");
        input.set_birthdate(day(1, 1, 1), today()).expect("no lower bound");
        assert!(input.is_complete(today()));
    }

    #[test]
    fn birthdate_text_formats() {
        let mut input = filled("a");
        input
            .set_birthdate_text("1985/07/20", today())
            .expect("slash format");
        assert_eq!(input.birthdate(), Some(day(1985, 7, 20)));
        input
            .set_birthdate_text("1985年07月21日", today())
            .expect("page format");
        assert_eq!(input.birthdate(), Some(day(1985, 7, 21)));
    }

    #[test]
    fn garbage_text_clears_and_flags() {
        let mut input = filled("a");
        assert!(matches!(
            input.set_birthdate_text("1985-13-40", today()),
            Err(ValidationError::InvalidBirthdate { .. })
        ));
        assert_eq!(input.birthdate(), None);
        assert!(!input.is_complete(today()));

        input.set_birthdate_text("   ", today()).expect("blank clears");
        assert!(input.flag().is_none());
        assert_eq!(input.validate(today()), Err(ValidationError::MissingBirthdate));
    }
}
