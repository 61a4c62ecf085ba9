//! Core domain logic for the fortune calculator.
//!
//! This crate holds the parts with no IO and no async: the process-wide
//! rating profile table, the projection from a report to a displayable view,
//! and user-facing error formatting.

pub mod errors;
mod profile;
mod view;

pub use profile::{ProfileError, RatingEntry, RatingProfile, Tone, UnknownToneError};
pub use view::{
    ATTRIBUTION, RatingBadge, RecommendationItem, RenderError, ReportHeader, ResultView, project,
};
