use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use semver::Version;

use crate::domain::commit::CommitSummary;
use crate::domain::content::GeneratedContent;
use crate::domain::version::VersionBump;
use crate::error::{ReleaseError, ReleaseResult};

/// Working state threaded through one chain run. Owned by the engine for the
/// lifetime of the run; stages take it by value and return the next state.
///
/// Core fields are typed; `scratch` is the extension side-channel for
/// stage-specific data that is not part of the release result.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    pub repo_path: PathBuf,
    pub dry_run: bool,
    pub requested_bump: Option<VersionBump>,
    pub summary: Option<CommitSummary>,
    pub bump: Option<VersionBump>,
    pub current_version: Option<Version>,
    pub next_version: Option<Version>,
    pub content: Option<GeneratedContent>,
    /// Repo-relative path to full replacement content, not yet written.
    pub staged_edits: BTreeMap<PathBuf, String>,
    pub scratch: BTreeMap<String, serde_json::Value>,
}

impl ReleaseContext {
    pub fn new(repo_path: &Path, requested_bump: Option<VersionBump>, dry_run: bool) -> Self {
        Self {
            repo_path: repo_path.to_path_buf(),
            dry_run,
            requested_bump,
            summary: None,
            bump: None,
            current_version: None,
            next_version: None,
            content: None,
            staged_edits: BTreeMap::new(),
            scratch: BTreeMap::new(),
        }
    }

    pub fn summary(&self) -> ReleaseResult<&CommitSummary> {
        self.summary
            .as_ref()
            .ok_or_else(|| ReleaseError::Validation("commit summary not yet computed".to_string()))
    }

    pub fn next_version(&self) -> ReleaseResult<&Version> {
        self.next_version
            .as_ref()
            .ok_or_else(|| ReleaseError::Validation("next version not yet computed".to_string()))
    }

    pub fn content(&self) -> ReleaseResult<&GeneratedContent> {
        self.content
            .as_ref()
            .ok_or_else(|| ReleaseError::Validation("release content not yet generated".to_string()))
    }
}

/// The outcome of one release run. Identical in shape for dry and real runs
/// so callers can diff-preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub version: Version,
    pub previous_version: Version,
    pub bump: VersionBump,
    pub content: GeneratedContent,
    pub staged_files: Vec<PathBuf>,
    pub tag: String,
    pub dry_run: bool,
}

impl ReleaseOutcome {
    pub fn from_context(ctx: &ReleaseContext, tag_prefix: &str) -> ReleaseResult<Self> {
        let version = ctx.next_version()?.clone();
        let previous_version = ctx.current_version.clone().ok_or_else(|| {
            ReleaseError::Validation("current version not yet determined".to_string())
        })?;
        let bump = ctx
            .bump
            .ok_or_else(|| ReleaseError::Validation("version bump not yet chosen".to_string()))?;
        Ok(Self {
            tag: format!("{tag_prefix}{version}"),
            version,
            previous_version,
            bump,
            content: ctx.content()?.clone(),
            staged_files: ctx.staged_edits.keys().cloned().collect(),
            dry_run: ctx.dry_run,
        })
    }
}

/// Release readiness snapshot, for callers deciding whether to run.
#[derive(Debug, Clone)]
pub struct ReleaseStatus {
    pub current_version: Version,
    pub pending_commits: usize,
    pub suggested_bump: VersionBump,
    pub contributors: BTreeSet<String>,
    pub ready_for_release: bool,
}
