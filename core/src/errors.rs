//! User-facing messages for calculation and rendering failures.

use fortune_types::{EngineError, EngineFailure, NonEmptyStaticStr, NonEmptyString};

use crate::view::RenderError;

const FAILURE_BADGE: NonEmptyStaticStr = NonEmptyStaticStr::new("[Calculation failed]");
const RENDER_BADGE: NonEmptyStaticStr = NonEmptyStaticStr::new("[Cannot display report]");

/// Format an engine failure for display next to the form.
///
/// The session is already back to idle when this is shown, so every message
/// ends with a retry hint.
#[must_use]
pub fn failure_notice(failure: &EngineFailure) -> NonEmptyString {
    let detail = match failure {
        EngineFailure::Timeout { elapsed } => format!(
            "The fortune engine did not answer within {:.1}s.",
            elapsed.as_secs_f64()
        ),
        EngineFailure::Engine(EngineError::Unavailable(reason)) => {
            format!("The fortune engine is unavailable: {}", reason.trim())
        }
        EngineFailure::Engine(EngineError::InvalidReport(err)) => {
            format!("The fortune engine returned an invalid report ({err}).")
        }
        EngineFailure::Engine(EngineError::Internal(reason)) => {
            let reason = reason.trim();
            if reason.is_empty() {
                "The fortune engine reported an unknown error.".to_string()
            } else {
                format!("The fortune engine reported an error: {reason}")
            }
        }
        EngineFailure::Panicked(_) => "The fortune engine crashed.".to_string(),
        EngineFailure::Disconnected => "The calculation was lost before it finished.".to_string(),
    };

    let mut content = String::new();
    content.push_str(FAILURE_BADGE.as_str());
    content.push_str("\n\n");
    content.push_str(&detail);
    content.push_str("\n\nSubmit again to retry.");
    NonEmptyString::new(content).unwrap_or_else(|_| FAILURE_BADGE.into())
}

/// Diagnostic shown in place of a report that could not be projected.
#[must_use]
pub fn render_failure_notice(err: &RenderError) -> NonEmptyString {
    let mut content = String::new();
    content.push_str(RENDER_BADGE.as_str());
    content.push_str("\n\n");
    content.push_str(&err.to_string());
    content.push_str("\n\nThis is a configuration error. Check the [ratings] section of the config file.");
    NonEmptyString::new(content).unwrap_or_else(|_| RENDER_BADGE.into())
}
