//! The chain engine: executes an ordered list of stages over a shared
//! release context, wrapping every stage invocation with the registered
//! middleware.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::chain::middleware::{Middleware, StageEvent};
use crate::domain::release::ReleaseContext;
use crate::error::{ChainFailure, FailureCause, ReleaseError, ReleaseResult};

/// One unit of work in the chain. Takes the current context and returns the
/// next one. Stages must be atomic with respect to externally observable
/// side effects, or roll back internally before returning an error.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, ctx: ReleaseContext) -> ReleaseResult<ReleaseContext>;
}

pub struct ChainEngine {
    middleware: Vec<Box<dyn Middleware>>,
    stage_timeout: Option<Duration>,
}

impl ChainEngine {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            stage_timeout: None,
        }
    }

    /// Registers a middleware. Invocation order on every phase is
    /// registration order.
    pub fn attach(mut self, middleware: Box<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Bounds every stage invocation. Default is unbounded.
    pub fn with_stage_timeout(mut self, limit: Duration) -> Self {
        self.stage_timeout = Some(limit);
        self
    }

    /// Runs the stages strictly in declared order. On any failure the
    /// remaining stages are skipped and the failure is returned together
    /// with the last-known-good context. Every failure is preceded by an
    /// `error` event to all middleware.
    pub async fn run(
        &self,
        stages: &[Box<dyn Stage>],
        mut ctx: ReleaseContext,
    ) -> Result<ReleaseContext, Box<ChainFailure>> {
        for stage in stages {
            let name = stage.name();

            for middleware in &self.middleware {
                if let Err(err) = middleware.before(&StageEvent::before(name, &ctx)) {
                    self.emit_error(name, &ctx, Duration::ZERO, &err);
                    return Err(Box::new(ChainFailure {
                        stage: name.to_string(),
                        cause: FailureCause::Middleware,
                        source: Box::new(err),
                        context: ctx,
                    }));
                }
            }

            let started = Instant::now();
            let attempt = match self.stage_timeout {
                Some(limit) => match tokio::time::timeout(limit, stage.run(ctx.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(ReleaseError::StageTimeout {
                        stage: name.to_string(),
                        limit,
                    }),
                },
                None => stage.run(ctx.clone()).await,
            };
            let elapsed = started.elapsed();

            match attempt {
                Ok(next) => {
                    ctx = next;
                    for middleware in &self.middleware {
                        middleware.after(&StageEvent::after(name, &ctx, elapsed));
                    }
                }
                Err(err) => {
                    let cause = match err {
                        ReleaseError::StageTimeout { .. } => FailureCause::Timeout,
                        _ => FailureCause::Stage,
                    };
                    self.emit_error(name, &ctx, elapsed, &err);
                    return Err(Box::new(ChainFailure {
                        stage: name.to_string(),
                        cause,
                        source: Box::new(err),
                        context: ctx,
                    }));
                }
            }
        }
        Ok(ctx)
    }

    fn emit_error(&self, stage: &str, ctx: &ReleaseContext, elapsed: Duration, err: &ReleaseError) {
        for middleware in &self.middleware {
            middleware.error(&StageEvent::error(stage, ctx, elapsed, err));
        }
    }
}

impl Default for ChainEngine {
    fn default() -> Self {
        Self::new()
    }
}
