//! Scenario runner.
//!
//! Runs one scenario body against a fresh driver session:
//!
//! 1. **setup**: `launch` produces a driver; failure yields a broken result
//!    and no hooks run.
//! 2. **call**: the body runs under `catch_unwind`, so a panicking
//!    assertion is a failure like any returned error. On failure every
//!    registered [`FailureHook`] sees the still-live session.
//! 3. **teardown**: the session is closed on every path.

use crate::attachment::{MemorySink, TestMetadata};
use crate::config::SuiteConfig;
use crate::driver::Driver;
use crate::failure::FailureHook;
use crate::reporter::{TestResultEntry, TestStatus};
use crate::result::PageCheckResult;
use crate::scenarios::Scenario;
use crate::session::DriverSession;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

/// Outcome of a scenario's call phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// Body returned `Ok`
    Passed,
    /// Body returned an error or panicked
    Failed(String),
    /// Body did not run
    Skipped(String),
}

impl ScenarioOutcome {
    /// Result status for this outcome
    #[must_use]
    pub const fn status(&self) -> TestStatus {
        match self {
            Self::Passed => TestStatus::Passed,
            Self::Failed(_) => TestStatus::Failed,
            Self::Skipped(_) => TestStatus::Skipped,
        }
    }

    /// Result entry for a scenario that ended with this outcome
    #[must_use]
    pub fn into_entry(self, name: &str, duration: Duration) -> TestResultEntry {
        match self {
            Self::Passed => TestResultEntry::passed(name, duration),
            Self::Failed(message) => TestResultEntry::failed(name, duration, message),
            Self::Skipped(reason) => TestResultEntry::skipped(name, reason),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Runs scenarios with guaranteed teardown and failure hooks
pub struct ScenarioRunner<D: Driver> {
    hooks: Vec<Box<dyn FailureHook<D>>>,
}

impl<D: Driver> fmt::Debug for ScenarioRunner<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl<D: Driver> Default for ScenarioRunner<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Driver> ScenarioRunner<D> {
    /// Runner without hooks
    #[must_use]
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a failure hook; hooks run in registration order
    #[must_use]
    pub fn with_hook(mut self, hook: impl FailureHook<D> + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Number of registered hooks
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Run `body` against a session produced by `launch`
    pub fn run<L, B>(&self, name: &str, metadata: TestMetadata, launch: L, body: B) -> TestResultEntry
    where
        L: FnOnce() -> PageCheckResult<D>,
        B: FnOnce(&mut D) -> PageCheckResult<()>,
    {
        let span = info_span!("scenario", name);
        let _guard = span.enter();
        let start = Instant::now();

        let driver = match launch() {
            Ok(driver) => driver,
            Err(err) => {
                warn!(error = %err, "setup failed");
                return TestResultEntry::broken(name, start.elapsed(), format!("setup failed: {err}"))
                    .with_metadata(metadata);
            }
        };
        let mut session = DriverSession::new(driver);

        let outcome = match catch_unwind(AssertUnwindSafe(|| body(&mut *session))) {
            Ok(Ok(())) => ScenarioOutcome::Passed,
            Ok(Err(err)) => ScenarioOutcome::Failed(err.to_string()),
            Err(payload) => ScenarioOutcome::Failed(panic_message(payload.as_ref())),
        };

        let mut sink = MemorySink::new();
        if let ScenarioOutcome::Failed(message) = &outcome {
            warn!(failure = %message, "scenario failed");
            for hook in &self.hooks {
                hook.on_failure(session.driver(), message, &mut sink);
            }
        }

        if let Err(err) = session.close() {
            warn!(error = %err, "teardown failed");
        }

        let duration = start.elapsed();
        info!(status = outcome.status().label(), ?duration, "scenario finished");
        outcome
            .into_entry(name, duration)
            .with_metadata(metadata)
            .with_attachments(sink.take())
    }

    /// Run a suite scenario with `config`
    pub fn run_scenario<L>(&self, scenario: &Scenario<D>, config: &SuiteConfig, launch: L) -> TestResultEntry
    where
        L: FnOnce() -> PageCheckResult<D>,
    {
        self.run(scenario.name, scenario.metadata(), launch, |driver| {
            (scenario.body)(driver, config)
        })
    }

    /// Record a scenario that was not run
    #[must_use]
    pub fn skip(&self, name: &str, metadata: TestMetadata, reason: &str) -> TestResultEntry {
        info!(name, reason, "scenario skipped");
        ScenarioOutcome::Skipped(reason.to_string())
            .into_entry(name, Duration::ZERO)
            .with_metadata(metadata)
    }
}
