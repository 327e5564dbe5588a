use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ReleaseConfig;
use crate::services::{LanguageModelService, VersionControlService};

/// Service container handed to workflows. Services are scoped to the caller;
/// each chain run builds its own middleware and release context.
#[derive(Clone)]
pub struct AppContext {
    pub config: ReleaseConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub language_model: Arc<dyn LanguageModelService>,
    /// Where to persist AI content between runs; `None` disables caching.
    pub content_cache: Option<PathBuf>,
}

impl AppContext {
    pub fn new(
        config: ReleaseConfig,
        version_control: Arc<dyn VersionControlService>,
        language_model: Arc<dyn LanguageModelService>,
        content_cache: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            version_control,
            language_model,
            content_cache,
        }
    }
}
