//! Cross-cutting observers wrapped around every stage invocation.
//!
//! Middleware observe; they never mutate the context. A middleware may
//! reject a stage by returning an error from `before`, which the engine
//! reports as a middleware-caused chain failure.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::domain::release::ReleaseContext;
use crate::error::{ReleaseError, ReleaseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Before,
    After,
    Error,
}

/// Read-only view of one stage invocation handed to middleware.
pub struct StageEvent<'a> {
    pub stage: &'a str,
    pub phase: StagePhase,
    pub context: &'a ReleaseContext,
    /// Present on `After` and `Error`.
    pub elapsed: Option<Duration>,
    /// Present on `Error`.
    pub error: Option<&'a ReleaseError>,
}

impl<'a> StageEvent<'a> {
    pub fn before(stage: &'a str, context: &'a ReleaseContext) -> Self {
        Self {
            stage,
            phase: StagePhase::Before,
            context,
            elapsed: None,
            error: None,
        }
    }

    pub fn after(stage: &'a str, context: &'a ReleaseContext, elapsed: Duration) -> Self {
        Self {
            stage,
            phase: StagePhase::After,
            context,
            elapsed: Some(elapsed),
            error: None,
        }
    }

    pub fn error(
        stage: &'a str,
        context: &'a ReleaseContext,
        elapsed: Duration,
        error: &'a ReleaseError,
    ) -> Self {
        Self {
            stage,
            phase: StagePhase::Error,
            context,
            elapsed: Some(elapsed),
            error: Some(error),
        }
    }
}

pub trait Middleware: Send + Sync {
    fn before(&self, _event: &StageEvent<'_>) -> ReleaseResult<()> {
        Ok(())
    }

    fn after(&self, _event: &StageEvent<'_>) {}

    fn error(&self, _event: &StageEvent<'_>) {}
}

/// Logs stage lifecycle through `tracing`.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(&self, event: &StageEvent<'_>) -> ReleaseResult<()> {
        info!(stage = event.stage, "starting stage");
        Ok(())
    }

    fn after(&self, event: &StageEvent<'_>) {
        info!(
            stage = event.stage,
            elapsed_ms = event.elapsed.unwrap_or_default().as_millis() as u64,
            "stage completed"
        );
    }

    fn error(&self, event: &StageEvent<'_>) {
        match event.error {
            Some(err) => error!(stage = event.stage, error = %err, "stage failed"),
            None => error!(stage = event.stage, "stage failed"),
        }
    }
}

/// Records per-stage wall time. Shared across one run only; a fresh instance
/// per run keeps runs independent.
pub struct TimingMiddleware {
    timings: Mutex<Vec<(String, Duration)>>,
}

impl TimingMiddleware {
    pub fn new() -> Self {
        Self {
            timings: Mutex::new(Vec::new()),
        }
    }

    #[cfg(test)]
    fn recorded(&self) -> Vec<(String, Duration)> {
        self.timings
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record(&self, stage: &str, elapsed: Option<Duration>) {
        if let (Ok(mut guard), Some(elapsed)) = (self.timings.lock(), elapsed) {
            guard.push((stage.to_string(), elapsed));
        }
    }
}

impl Default for TimingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TimingMiddleware {
    fn after(&self, event: &StageEvent<'_>) {
        self.record(event.stage, event.elapsed);
        debug!(
            stage = event.stage,
            elapsed_ms = event.elapsed.unwrap_or_default().as_millis() as u64,
            "stage timing"
        );
    }

    fn error(&self, event: &StageEvent<'_>) {
        self.record(event.stage, event.elapsed);
    }
}

pub type ContextCheck = fn(&ReleaseContext) -> Result<(), String>;

/// Rejects a stage in `before` when a registered precondition on the context
/// does not hold. Checks are keyed by stage name; unknown stages pass.
pub struct ValidationMiddleware {
    checks: Vec<(&'static str, ContextCheck)>,
}

impl ValidationMiddleware {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn require(mut self, stage: &'static str, check: ContextCheck) -> Self {
        self.checks.push((stage, check));
        self
    }
}

impl Default for ValidationMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for ValidationMiddleware {
    fn before(&self, event: &StageEvent<'_>) -> ReleaseResult<()> {
        for (stage, check) in &self.checks {
            if *stage == event.stage {
                check(event.context).map_err(ReleaseError::Validation)?;
            }
        }
        Ok(())
    }
}
