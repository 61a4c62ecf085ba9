//! Fortune engine contract and the bundled implementations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fortune_types::settings::{EngineKind, EngineSettings};
use fortune_types::{EngineError, FortuneReport, Identity};

mod sample;
mod table;

pub use sample::SampleEngine;
pub use table::TableEngine;

/// Engine calculation future type alias.
pub type EngineFut<'a> = Pin<Box<dyn Future<Output = Result<FortuneReport, EngineError>> + Send + 'a>>;

/// Produces a report from a validated identity.
///
/// Implementations must be deterministic for a given identity within one
/// process. They may take arbitrarily long; the caller enforces the timeout.
pub trait FortuneEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn calculate<'a>(&'a self, identity: &'a Identity) -> EngineFut<'a>;
}

/// Build the engine selected in config.
#[must_use]
pub fn build_engine(settings: &EngineSettings) -> Arc<dyn FortuneEngine> {
    match settings.kind {
        EngineKind::Sample => Arc::new(SampleEngine::new(settings.delay)),
        EngineKind::Table => Arc::new(TableEngine::new(settings.delay)),
    }
}
