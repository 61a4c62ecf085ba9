//! Calculation engine for the fortune calculator.
//!
//! This crate owns everything between a key press and a settled report: the
//! form draft, the Idle/Pending/Settled session machine, the engine contract,
//! and the async dispatch that enforces the deadline. It knows nothing about
//! terminals.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod calculator;
mod dispatch;
pub mod engines;
mod input;
mod session;

pub use calculator::{Calculator, SessionEvent, SubmitError};
pub use dispatch::run_calculation;
pub use engines::{EngineFut, FortuneEngine, SampleEngine, TableEngine, build_engine};
pub use input::InputCollector;
pub use session::{CalculationSession, Phase, Transition, TransitionError};

// Re-export the types the presentation layer needs alongside the calculator.
pub use fortune_core::{
    ATTRIBUTION, RatingBadge, RatingProfile, RecommendationItem, RenderError, ReportHeader,
    ResultView, Tone,
};
pub use fortune_types::{
    EngineFailure, FortuneReport, Identity, Rating, ValidationError, settings::UiOptions,
};
