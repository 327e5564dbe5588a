//! Release preparation pipeline: reads git history since the last release
//! tag, classifies conventional commits, computes the semantic version bump,
//! generates release documentation (AI with a deterministic template
//! fallback), and applies the edits, commit, and tag through an ordered
//! stage chain.

pub mod cache;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod content;
pub mod context;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod workflow;

pub use crate::config::ReleaseConfig;
pub use crate::context::AppContext;
pub use crate::error::{ReleaseError, ReleaseResult};
