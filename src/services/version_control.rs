use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::commit::RawCommit;
use crate::error::ReleaseResult;

#[async_trait]
pub trait VersionControlService: Send + Sync {
    /// The most recent release marker, if any exists.
    async fn last_release_tag(&self) -> ReleaseResult<Option<String>>;

    /// Commits after `last_tag` (exclusive) up to HEAD (inclusive), in the
    /// backend's reverse-chronological order. With no marker, the full
    /// history; an empty repository is a repository-state error.
    async fn commits_since(&self, last_tag: Option<&str>) -> ReleaseResult<Vec<RawCommit>>;

    async fn is_clean(&self) -> ReleaseResult<bool>;

    /// Paths are relative to the repository root.
    async fn stage_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()>;

    async fn commit(&self, message: &str) -> ReleaseResult<()>;

    async fn create_tag(&self, name: &str, message: &str) -> ReleaseResult<()>;
}
