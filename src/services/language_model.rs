use async_trait::async_trait;

use crate::error::ReleaseResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn complete(&self, prompt: &str) -> ReleaseResult<String>;
}
