//! The calculator: form draft, session and engine wired together.
//!
//! The presentation layer owns one [`Calculator`] and drives it from its tick
//! loop: edits and `submit` come from key events, [`Calculator::poll`] applies
//! a finished calculation without blocking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use fortune_core::{RatingProfile, RenderError, ReportHeader, ResultView, errors, project};
use fortune_types::settings::FormDefaults;
use fortune_types::{EngineFailure, FortuneReport, NonEmptyString, Rating, Score, ValidationError};

use crate::dispatch::{panic_payload_to_string, run_calculation};
use crate::engines::FortuneEngine;
use crate::input::InputCollector;
use crate::session::{CalculationSession, Phase, TransitionError};

type CalculationHandle = JoinHandle<Result<FortuneReport, EngineFailure>>;

/// Observable session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Submitted { engine: &'static str },
    Settled { rating: Rating, score: Score },
    Failed(EngineFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a calculation cannot start while {0}")]
    Busy(Phase),
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Calculator {
    input: InputCollector,
    session: CalculationSession,
    engine: Arc<dyn FortuneEngine>,
    profile: Arc<RatingProfile>,
    timeout: Duration,
    in_flight: Option<CalculationHandle>,
    last_failure: Option<EngineFailure>,
    today: fn() -> NaiveDate,
}

impl Calculator {
    #[must_use]
    pub fn new(
        engine: Arc<dyn FortuneEngine>,
        profile: Arc<RatingProfile>,
        timeout: Duration,
        defaults: &FormDefaults,
    ) -> Self {
        Self {
            input: InputCollector::new(defaults),
            session: CalculationSession::new(),
            engine,
            profile,
            timeout,
            in_flight: None,
            last_failure: None,
            today: local_today,
        }
    }

    /// Replace the calendar used for "not in the future" checks.
    #[must_use]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    #[must_use]
    pub fn input(&self) -> &InputCollector {
        &self.input
    }

    #[must_use]
    pub fn session(&self) -> &CalculationSession {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn set_name(&mut self, text: impl Into<String>) {
        self.input.set_name(text);
    }

    pub fn set_birthdate(&mut self, date: NaiveDate) -> Result<(), ValidationError> {
        let today = self.today();
        self.input.set_birthdate(date, today)
    }

    pub fn set_birthdate_text(&mut self, raw: &str) -> Result<(), ValidationError> {
        let today = self.today();
        self.input.set_birthdate_text(raw, today)
    }

    /// True iff the draft validates and nothing is in flight or displayed.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase() == Phase::Idle && self.input.is_complete(self.today())
    }

    /// Start a calculation for the current draft.
    ///
    /// Rejected submissions change nothing and never reach the engine. Must be
    /// called from inside a tokio runtime.
    pub fn submit(&mut self) -> Result<SessionEvent, SubmitError> {
        let phase = self.phase();
        if phase != Phase::Idle {
            tracing::debug!(%phase, "Ignoring submit");
            return Err(SubmitError::Busy(phase));
        }
        let identity = self.input.validate(self.today())?;

        self.session
            .begin(identity.clone())
            .map_err(|err| SubmitError::Busy(err.phase))?;
        self.last_failure = None;

        tracing::info!(
            engine = self.engine.name(),
            name_len = identity.name().as_str().chars().count(),
            timeout_ms = self.timeout.as_millis(),
            "Calculation submitted"
        );
        self.in_flight = Some(tokio::spawn(run_calculation(
            Arc::clone(&self.engine),
            identity,
            self.timeout,
        )));
        Ok(SessionEvent::Submitted {
            engine: self.engine.name(),
        })
    }

    /// Apply the in-flight calculation if it has finished. Never blocks.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        let handle = self.in_flight.as_mut()?;
        let joined = handle.now_or_never()?;
        self.in_flight = None;
        Some(self.apply(joined))
    }

    /// Wait for the in-flight calculation and apply it.
    pub async fn settle(&mut self) -> Option<SessionEvent> {
        let handle = self.in_flight.take()?;
        let joined = handle.await;
        Some(self.apply(joined))
    }

    fn apply(&mut self, joined: Result<Result<FortuneReport, EngineFailure>, JoinError>) -> SessionEvent {
        let outcome = joined.unwrap_or_else(|err| Err(join_failure(err)));
        match outcome {
            Ok(report) => {
                let (rating, score) = (report.rating(), report.score());
                if let Err(err) = self.session.resolve(report) {
                    tracing::error!(%err, "Calculation finished outside a pending session");
                }
                tracing::info!(rating = %rating, score = score.value(), "Calculation settled");
                SessionEvent::Settled { rating, score }
            }
            Err(failure) => {
                if let Err(err) = self.session.fail(&failure) {
                    tracing::error!(%err, "Calculation failed outside a pending session");
                }
                self.last_failure = Some(failure.clone());
                SessionEvent::Failed(failure)
            }
        }
    }

    /// Discard the displayed report. The draft is kept.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.session.reset()?;
        self.last_failure = None;
        Ok(())
    }

    /// Project the settled report. `None` unless settled.
    #[must_use]
    pub fn view(&self) -> Option<Result<ResultView, RenderError>> {
        self.session
            .result()
            .map(|report| project(report, &self.profile))
    }

    #[must_use]
    pub fn header(&self) -> Option<ReportHeader> {
        self.session.request().map(ReportHeader::new)
    }

    /// User-facing text for the last failure, cleared by the next submit.
    #[must_use]
    pub fn failure_notice(&self) -> Option<NonEmptyString> {
        self.last_failure.as_ref().map(errors::failure_notice)
    }
}

fn join_failure(err: JoinError) -> EngineFailure {
    if err.is_panic() {
        EngineFailure::Panicked(panic_payload_to_string(&err.into_panic()))
    } else {
        EngineFailure::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fortune_core::{RatingEntry, Tone};
    use fortune_types::{Category, EngineError, Identity};

    use super::*;
    use crate::engines::{EngineFut, SampleEngine};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn today() -> NaiveDate {
        day(2024, 6, 1)
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Report,
        Fail,
        Panic,
    }

    /// Counts calls; answers after `delay` according to `behavior`.
    struct Scripted {
        calls: AtomicUsize,
        delay: Duration,
        behavior: Behavior,
    }

    impl Scripted {
        fn new(delay: Duration, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                behavior,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FortuneEngine for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn calculate<'a>(&'a self, _identity: &'a Identity) -> EngineFut<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                match self.behavior {
                    Behavior::Report => {
                        let recommendations = vec![
                            fortune_types::Recommendation::new("投资理财", "...", Category::Do)?,
                            fortune_types::Recommendation::new("冲动消费", "...", Category::Avoid)?,
                        ];
                        Ok(FortuneReport::new(Rating::Good, 78, recommendations, "...")?)
                    }
                    Behavior::Fail => Err(EngineError::Internal("no stars tonight".into())),
                    Behavior::Panic => panic!("engine exploded"),
                }
            })
        }
    }

    fn calculator(engine: Arc<dyn FortuneEngine>, timeout: Duration) -> Calculator {
        let mut calc = Calculator::new(
            engine,
            Arc::new(RatingProfile::builtin().clone()),
            timeout,
            &FormDefaults::default(),
        )
        .with_clock(today);
        calc.set_name("张三");
        calc.set_birthdate(day(1990, 1, 1)).expect("past date");
        calc
    }

    #[tokio::test(start_paused = true)]
    async fn can_submit_tracks_phase_and_draft() {
        let engine = Scripted::new(Duration::from_millis(100), Behavior::Report);
        let mut calc = calculator(engine, Duration::from_secs(5));
        assert!(calc.can_submit());

        calc.set_name("  ");
        assert!(!calc.can_submit());
        calc.set_name("张三");

        calc.submit().expect("submit");
        assert_eq!(calc.phase(), Phase::Pending);
        assert!(!calc.can_submit());

        calc.settle().await.expect("event");
        assert_eq!(calc.phase(), Phase::Settled);
        assert!(!calc.can_submit());

        calc.reset().expect("reset");
        assert!(calc.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_submit_is_a_no_op() {
        let engine = Scripted::new(Duration::from_millis(500), Behavior::Report);
        let mut calc = calculator(engine.clone(), Duration::from_secs(5));

        assert_eq!(
            calc.submit(),
            Ok(SessionEvent::Submitted { engine: "scripted" })
        );
        let before = calc.session().clone();

        calc.set_name("李四");
        assert_eq!(calc.submit(), Err(SubmitError::Busy(Phase::Pending)));
        assert_eq!(calc.session(), &before);

        calc.settle().await.expect("event");
        assert_eq!(engine.calls(), 1);
        assert_eq!(
            calc.header().map(|h| h.name),
            Some("张三".to_string()),
            "report belongs to the first request"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_restores_initial_session_and_keeps_draft() {
        let engine = Scripted::new(Duration::from_millis(100), Behavior::Report);
        let mut calc = calculator(engine, Duration::from_secs(5));

        calc.submit().expect("submit");
        let event = calc.settle().await.expect("event");
        assert_eq!(
            event,
            SessionEvent::Settled {
                rating: Rating::Good,
                score: Score::new(78).expect("score"),
            }
        );

        let view = calc.view().expect("settled").expect("complete profile");
        assert_eq!(view.badge.label, "小吉");
        assert_eq!(view.badge.tone, Tone::Emerald);
        assert_eq!(view.score.value(), 78);
        assert_eq!(view.encouraged.len(), 1);
        assert_eq!(view.discouraged.len(), 1);
        assert_eq!(
            calc.header().map(|h| h.to_string()),
            Some("张三 · 1990-01-01".to_string())
        );

        calc.reset().expect("reset");
        assert_eq!(calc.session(), &CalculationSession::new());
        assert!(calc.view().is_none());
        assert_eq!(calc.input().name(), "张三");
        assert_eq!(calc.input().birthdate(), Some(day(1990, 1, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_applies_result_without_blocking() {
        let engine = Arc::new(SampleEngine::new(Duration::from_millis(1_500)));
        let mut calc = calculator(engine, Duration::from_secs(5));

        calc.submit().expect("submit");
        assert_eq!(calc.poll(), None);
        assert_eq!(calc.phase(), Phase::Pending);

        let mut event = None;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            event = calc.poll();
            if event.is_some() {
                break;
            }
        }
        assert!(matches!(event, Some(SessionEvent::Settled { .. })));
        assert_eq!(calc.phase(), Phase::Settled);
        assert_eq!(calc.poll(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_to_idle_and_allows_retry() {
        let engine = Scripted::new(Duration::from_secs(30), Behavior::Report);
        let mut calc = calculator(engine.clone(), Duration::from_secs(5));

        calc.submit().expect("submit");
        let event = calc.settle().await.expect("event");
        assert_eq!(
            event,
            SessionEvent::Failed(EngineFailure::Timeout {
                elapsed: Duration::from_secs(5)
            })
        );
        assert_eq!(calc.phase(), Phase::Idle);
        assert!(calc.session().request().is_none());
        let notice = calc.failure_notice().expect("failure surfaced");
        assert!(notice.contains("5.0s"));

        assert!(calc.can_submit());
        calc.submit().expect("immediate retry");
        assert!(calc.failure_notice().is_none());
        // The engine is only invoked once the spawned task first runs.
        tokio::task::yield_now().await;
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn future_birthdate_blocks_submission() {
        let engine = Scripted::new(Duration::ZERO, Behavior::Report);
        let mut calc = calculator(engine.clone(), Duration::from_secs(5));

        let tomorrow = day(2024, 6, 2);
        assert_eq!(
            calc.set_birthdate(tomorrow),
            Err(ValidationError::FutureBirthdate { date: tomorrow })
        );
        assert!(!calc.can_submit());
        assert_eq!(
            calc.submit(),
            Err(SubmitError::Invalid(ValidationError::FutureBirthdate {
                date: tomorrow
            }))
        );
        assert_eq!(calc.phase(), Phase::Idle);
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_error_and_panic_are_surfaced() {
        let failing = Scripted::new(Duration::ZERO, Behavior::Fail);
        let mut calc = calculator(failing, Duration::from_secs(5));
        calc.submit().expect("submit");
        assert!(matches!(
            calc.settle().await,
            Some(SessionEvent::Failed(EngineFailure::Engine(EngineError::Internal(_))))
        ));
        assert_eq!(calc.phase(), Phase::Idle);

        let panicking = Scripted::new(Duration::ZERO, Behavior::Panic);
        let mut calc = calculator(panicking, Duration::from_secs(5));
        calc.submit().expect("submit");
        assert_eq!(
            calc.settle().await,
            Some(SessionEvent::Failed(EngineFailure::Panicked(
                "engine exploded".into()
            )))
        );
        assert_eq!(calc.phase(), Phase::Idle);
        assert!(calc.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_pending_is_rejected() {
        let engine = Scripted::new(Duration::from_secs(1), Behavior::Report);
        let mut calc = calculator(engine, Duration::from_secs(5));
        calc.submit().expect("submit");
        assert!(calc.reset().is_err());
        assert_eq!(calc.phase(), Phase::Pending);
        calc.settle().await.expect("event");
        assert_eq!(calc.phase(), Phase::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_profile_halts_rendering() {
        let partial = RatingProfile::from_entries([(
            Rating::Great,
            RatingEntry {
                label: "A".try_into().expect("label"),
                tone: Tone::Green,
                description: "d".try_into().expect("description"),
            },
        )])
        .expect("partial");
        let engine = Scripted::new(Duration::ZERO, Behavior::Report);
        let mut calc = Calculator::new(
            engine,
            Arc::new(partial),
            Duration::from_secs(5),
            &FormDefaults {
                name: "张三".to_string(),
                birthdate: Some(day(1990, 1, 1)),
            },
        )
        .with_clock(today);

        calc.submit().expect("submit");
        calc.settle().await.expect("event");
        assert_eq!(
            calc.view(),
            Some(Err(RenderError::MissingProfile {
                rating: Rating::Good
            }))
        );
    }

    #[tokio::test]
    async fn aborted_task_maps_to_disconnected() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err = handle.await.expect_err("aborted");
        assert_eq!(join_failure(err), EngineFailure::Disconnected);
    }
}
