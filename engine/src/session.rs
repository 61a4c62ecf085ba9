//! Calculation session state machine.
//!
//! # State Machine
//! ```text
//! ┌──────┐  begin(request)  ┌─────────────────┐  resolve(report)  ┌──────────────────────────┐
//! │ Idle │ ───────────────> │ Pending(request)│ ────────────────> │ Settled(request, report) │
//! └──────┘                  └─────────────────┘                   └──────────────────────────┘
//!    ^  ^                          │                                         │
//!    │  └───────── fail(failure) ──┘                                         │
//!    └──────────────────────────────────── reset() ──────────────────────────┘
//! ```
//!
//! Every other transition is rejected with [`TransitionError`] and leaves the
//! state untouched. The machine is pure: it never spawns or awaits anything.

use std::fmt;

use thiserror::Error;

use fortune_types::{EngineFailure, FortuneReport, Identity};

/// Coarse lifecycle phase, enough for a presentation layer to pick a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Settled,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Settled => "settled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    Resolve,
    Fail,
    Reset,
}

impl Transition {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "submit",
            Self::Resolve => "apply a result",
            Self::Fail => "apply a failure",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {} while {phase}", transition.as_str())]
pub struct TransitionError {
    pub transition: Transition,
    pub phase: Phase,
}

/// Session state. The request and report live inside the variants that own
/// them, so "settled without a report" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum SessionState {
    #[default]
    Idle,
    Pending {
        request: Identity,
    },
    Settled {
        request: Identity,
        report: FortuneReport,
    },
}

impl SessionState {
    fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Pending { .. } => Phase::Pending,
            Self::Settled { .. } => Phase::Settled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalculationSession {
    state: SessionState,
}

impl CalculationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    #[must_use]
    pub fn request(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Pending { request } | SessionState::Settled { request, .. } => {
                Some(request)
            }
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&FortuneReport> {
        match &self.state {
            SessionState::Settled { report, .. } => Some(report),
            _ => None,
        }
    }

    fn reject(&self, transition: Transition) -> TransitionError {
        let err = TransitionError {
            transition,
            phase: self.phase(),
        };
        tracing::debug!(%err, "Rejected session transition");
        err
    }

    /// Idle -> Pending.
    pub fn begin(&mut self, request: Identity) -> Result<(), TransitionError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(self.reject(Transition::Begin));
        }
        self.state = SessionState::Pending { request };
        tracing::debug!("Session idle -> pending");
        Ok(())
    }

    /// Pending -> Settled. The only way into `Settled`.
    pub fn resolve(&mut self, report: FortuneReport) -> Result<(), TransitionError> {
        self.state = match std::mem::take(&mut self.state) {
            SessionState::Pending { request } => SessionState::Settled { request, report },
            other => {
                self.state = other;
                return Err(self.reject(Transition::Resolve));
            }
        };
        tracing::debug!("Session pending -> settled");
        Ok(())
    }

    /// Pending -> Idle. Returns the abandoned request.
    pub fn fail(&mut self, failure: &EngineFailure) -> Result<Identity, TransitionError> {
        match std::mem::take(&mut self.state) {
            SessionState::Pending { request } => {
                tracing::debug!(%failure, "Session pending -> idle after failure");
                Ok(request)
            }
            other => {
                self.state = other;
                Err(self.reject(Transition::Fail))
            }
        }
    }

    /// Settled -> Idle, discarding request and report.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if !matches!(self.state, SessionState::Settled { .. }) {
            return Err(self.reject(Transition::Reset));
        }
        self.state = SessionState::Idle;
        tracing::debug!("Session settled -> idle");
        Ok(())
    }
}
