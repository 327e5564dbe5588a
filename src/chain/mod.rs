pub mod engine;
pub mod middleware;

pub use engine::{ChainEngine, Stage};
pub use middleware::{
    LoggingMiddleware, Middleware, StageEvent, StagePhase, TimingMiddleware, ValidationMiddleware,
};
