use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::domain::release::ReleaseContext;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("repository state error: {0}")]
    RepositoryState(String),
    #[error("no releasable changes since the last release")]
    NoReleasableChanges,
    #[error("version regression: {next} does not exceed {current}")]
    VersionRegression {
        current: semver::Version,
        next: semver::Version,
    },
    #[error("content generation failed: {0}")]
    ContentGeneration(String),
    #[error("language model error: {0}")]
    LanguageModel(String),
    #[error("version control error: {0}")]
    VersionControl(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("stage '{stage}' timed out after {limit:?}")]
    StageTimeout { stage: String, limit: Duration },
    #[error(transparent)]
    Chain(#[from] Box<ChainFailure>),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ReleaseError {
    /// Unwraps chain envelopes down to the error that actually failed the run.
    pub fn root_cause(&self) -> &ReleaseError {
        match self {
            ReleaseError::Chain(failure) => failure.source.root_cause(),
            other => other,
        }
    }
}

/// Why a chain run aborted: the stage itself, a middleware rejection during
/// `before`, or the per-stage timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Stage,
    Middleware,
    Timeout,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::Stage => "stage",
            FailureCause::Middleware => "middleware",
            FailureCause::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chain run that aborted. Carries the last-known-good context so callers
/// can inspect how far the run got.
#[derive(Debug, Error)]
#[error("stage '{stage}' failed ({cause}): {source}")]
pub struct ChainFailure {
    pub stage: String,
    pub cause: FailureCause,
    pub source: Box<ReleaseError>,
    pub context: ReleaseContext,
}

pub type ReleaseResult<T> = Result<T, ReleaseError>;
