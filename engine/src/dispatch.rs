//! Running one engine call under a deadline.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use fortune_types::{EngineFailure, FortuneReport, Identity};

use crate::engines::FortuneEngine;

/// Call the engine, converting timeout, error and panic into [`EngineFailure`].
pub async fn run_calculation(
    engine: Arc<dyn FortuneEngine>,
    identity: Identity,
    timeout: Duration,
) -> Result<FortuneReport, EngineFailure> {
    let calculation = AssertUnwindSafe(engine.calculate(&identity)).catch_unwind();

    let outcome = match tokio::time::timeout(timeout, calculation).await {
        Err(_) => Err(EngineFailure::Timeout { elapsed: timeout }),
        Ok(Err(panic_payload)) => Err(EngineFailure::Panicked(panic_payload_to_string(
            &panic_payload,
        ))),
        Ok(Ok(result)) => result.map_err(EngineFailure::from),
    };

    match &outcome {
        Ok(report) => tracing::debug!(
            engine = engine.name(),
            rating = %report.rating(),
            score = report.score().value(),
            "Engine returned report"
        ),
        Err(failure) => tracing::warn!(engine = engine.name(), %failure, "Engine call failed"),
    }
    outcome
}

pub(crate) fn panic_payload_to_string(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
