//! Read-only release readiness check.

use std::path::Path;

use crate::classifier;
use crate::context::AppContext;
use crate::domain::release::ReleaseStatus;
use crate::domain::version::{self, VersionBump};
use crate::error::ReleaseResult;
use crate::workflow::files;

/// Inspects the repository without mutating anything: commits since the last
/// release tag, the bump they suggest, and whether a release would succeed.
pub async fn release_status(app: &AppContext, repo_path: &Path) -> ReleaseResult<ReleaseStatus> {
    let last_tag = app.version_control.last_release_tag().await?;
    let raw_commits = app
        .version_control
        .commits_since(last_tag.as_deref())
        .await?;
    let summary = classifier::classify(&raw_commits);
    let current_version = files::read_current_version(repo_path, &app.config.version.files)?;
    let suggested_bump = version::suggest_bump(&summary);

    Ok(ReleaseStatus {
        current_version,
        pending_commits: summary.total_commits,
        contributors: summary.contributors.clone(),
        ready_for_release: suggested_bump != VersionBump::None,
        suggested_bump,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseConfig;
    use crate::domain::commit::RawCommit;
    use crate::error::ReleaseError;
    use crate::services::{LanguageModelService, VersionControlService};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct FixedVcs {
        commits: Vec<RawCommit>,
    }

    #[async_trait]
    impl VersionControlService for FixedVcs {
        async fn last_release_tag(&self) -> ReleaseResult<Option<String>> {
            Ok(Some("v1.0.0".to_string()))
        }

        async fn commits_since(&self, _last_tag: Option<&str>) -> ReleaseResult<Vec<RawCommit>> {
            Ok(self.commits.clone())
        }

        async fn is_clean(&self) -> ReleaseResult<bool> {
            Ok(true)
        }

        async fn stage_paths(&self, _paths: &[PathBuf]) -> ReleaseResult<()> {
            Ok(())
        }

        async fn commit(&self, _message: &str) -> ReleaseResult<()> {
            Ok(())
        }

        async fn create_tag(&self, _name: &str, _message: &str) -> ReleaseResult<()> {
            Ok(())
        }
    }

    struct NoModel;

    #[async_trait]
    impl LanguageModelService for NoModel {
        async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
            Err(ReleaseError::LanguageModel("not used".to_string()))
        }
    }

    fn commit(subject: &str) -> RawCommit {
        RawCommit {
            hash: "abc1234".to_string(),
            author: "ada".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 20, 10, 0, 0).unwrap(),
            subject: subject.to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn reports_pending_commits_and_suggested_bump() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        let vcs = Arc::new(FixedVcs {
            commits: vec![commit("feat: add thing"), commit("fix: patch thing")],
        });
        let app = AppContext::new(ReleaseConfig::default(), vcs, Arc::new(NoModel), None);

        let status = release_status(&app, dir.path()).await.unwrap();
        assert_eq!(status.current_version, semver::Version::new(1, 0, 0));
        assert_eq!(status.pending_commits, 2);
        assert_eq!(status.suggested_bump, VersionBump::Minor);
        assert!(status.ready_for_release);
        assert!(status.contributors.contains("ada"));
    }

    #[tokio::test]
    async fn unknown_only_history_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        let vcs = Arc::new(FixedVcs {
            commits: vec![commit("update stuff")],
        });
        let app = AppContext::new(ReleaseConfig::default(), vcs, Arc::new(NoModel), None);

        let status = release_status(&app, dir.path()).await.unwrap();
        assert_eq!(status.pending_commits, 1);
        assert_eq!(status.suggested_bump, VersionBump::None);
        assert!(!status.ready_for_release);
    }
}
