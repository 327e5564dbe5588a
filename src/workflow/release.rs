//! The release chain: stage implementations and the entry point that
//! assembles and runs them.
//!
//! Real runs execute
//! `read_history → classify_commits → determine_bump → generate_content →
//! stage_edits → commit_release → tag_release`. Dry runs stop after
//! `stage_edits`, which only computes the edit map, so the outcome can be
//! diff-previewed without touching the repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::ContentCache;
use crate::chain::{
    ChainEngine, LoggingMiddleware, Stage, TimingMiddleware, ValidationMiddleware,
};
use crate::classifier;
use crate::config::AiConfig;
use crate::content::ContentGenerator;
use crate::context::AppContext;
use crate::domain::commit::RawCommit;
use crate::domain::content::ContentSource;
use crate::domain::release::{ReleaseContext, ReleaseOutcome};
use crate::domain::version::{self, VersionBump};
use crate::error::{ReleaseError, ReleaseResult};
use crate::services::{LanguageModelService, VersionControlService};
use crate::workflow::files;

pub const READ_HISTORY: &str = "read_history";
pub const CLASSIFY_COMMITS: &str = "classify_commits";
pub const DETERMINE_BUMP: &str = "determine_bump";
pub const GENERATE_CONTENT: &str = "generate_content";
pub const STAGE_EDITS: &str = "stage_edits";
pub const COMMIT_RELEASE: &str = "commit_release";
pub const TAG_RELEASE: &str = "tag_release";

const RAW_COMMITS_KEY: &str = "raw_commits";
const RELEASE_NOTES_FILE: &str = "release-notes.md";
const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Runs the full release pipeline. When `dry_run` is set, the outcome is
/// computed identically but nothing is written, committed, or tagged.
pub async fn execute_release(
    app: &AppContext,
    repo_path: &Path,
    requested_bump: Option<VersionBump>,
    dry_run: bool,
) -> ReleaseResult<ReleaseOutcome> {
    if app.config.git.require_clean_working_tree && !app.version_control.is_clean().await? {
        return Err(ReleaseError::RepositoryState(
            "working tree has uncommitted changes".to_string(),
        ));
    }

    let engine = ChainEngine::new()
        .attach(Box::new(LoggingMiddleware))
        .attach(Box::new(TimingMiddleware::new()))
        .attach(Box::new(validation()));

    let stages = build_stages(app, dry_run);
    let ctx = ReleaseContext::new(repo_path, requested_bump, dry_run);
    let final_ctx = engine.run(&stages, ctx).await?;
    ReleaseOutcome::from_context(&final_ctx, &app.config.git.tag_prefix)
}

fn build_stages(app: &AppContext, dry_run: bool) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(ReadHistory {
            vcs: app.version_control.clone(),
        }),
        Box::new(ClassifyCommits),
        Box::new(DetermineBump {
            version_files: app.config.version.files.clone(),
        }),
        Box::new(GenerateContent {
            model: app.language_model.clone(),
            ai: app.config.ai.clone(),
            cache_path: app.content_cache.clone(),
        }),
        Box::new(StageEdits {
            version_files: app.config.version.files.clone(),
        }),
    ];
    if !dry_run {
        stages.push(Box::new(CommitRelease {
            vcs: app.version_control.clone(),
        }));
        stages.push(Box::new(TagRelease {
            vcs: app.version_control.clone(),
            tag_prefix: app.config.git.tag_prefix.clone(),
        }));
    }
    stages
}

fn validation() -> ValidationMiddleware {
    ValidationMiddleware::new()
        .require(DETERMINE_BUMP, |ctx| {
            if ctx.summary.is_none() {
                return Err("commit summary not computed before bump determination".to_string());
            }
            Ok(())
        })
        .require(GENERATE_CONTENT, |ctx| {
            if ctx.next_version.is_none() {
                return Err("next version not computed before content generation".to_string());
            }
            Ok(())
        })
        .require(COMMIT_RELEASE, |ctx| {
            if ctx.staged_edits.is_empty() {
                return Err("no staged edits to commit".to_string());
            }
            Ok(())
        })
}

struct ReadHistory {
    vcs: Arc<dyn VersionControlService>,
}

#[async_trait]
impl Stage for ReadHistory {
    fn name(&self) -> &'static str {
        READ_HISTORY
    }

    async fn run(&self, mut ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let last_tag = self.vcs.last_release_tag().await?;
        debug!(last_tag = last_tag.as_deref().unwrap_or("<none>"), "reading commit history");
        let raw_commits = self.vcs.commits_since(last_tag.as_deref()).await?;
        let encoded = serde_json::to_value(&raw_commits).map_err(|err| {
            ReleaseError::VersionControl(format!("failed to encode commit history: {err}"))
        })?;
        ctx.scratch.insert(RAW_COMMITS_KEY.to_string(), encoded);
        Ok(ctx)
    }
}

struct ClassifyCommits;

#[async_trait]
impl Stage for ClassifyCommits {
    fn name(&self) -> &'static str {
        CLASSIFY_COMMITS
    }

    async fn run(&self, mut ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let encoded = ctx.scratch.get(RAW_COMMITS_KEY).ok_or_else(|| {
            ReleaseError::Validation("commit history not read before classification".to_string())
        })?;
        let raw_commits: Vec<RawCommit> =
            serde_json::from_value(encoded.clone()).map_err(|err| {
                ReleaseError::Validation(format!("commit history in unexpected shape: {err}"))
            })?;
        ctx.summary = Some(classifier::classify(&raw_commits));
        Ok(ctx)
    }
}

struct DetermineBump {
    version_files: Vec<PathBuf>,
}

#[async_trait]
impl Stage for DetermineBump {
    fn name(&self) -> &'static str {
        DETERMINE_BUMP
    }

    async fn run(&self, mut ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let current = files::read_current_version(&ctx.repo_path, &self.version_files)?;
        let (next, bump) = version::next_version(&current, ctx.summary()?, ctx.requested_bump)?;
        debug!(current = %current, next = %next, bump = bump.as_str(), "version determined");
        ctx.current_version = Some(current);
        ctx.next_version = Some(next);
        ctx.bump = Some(bump);
        Ok(ctx)
    }
}

struct GenerateContent {
    model: Arc<dyn LanguageModelService>,
    ai: AiConfig,
    cache_path: Option<PathBuf>,
}

#[async_trait]
impl Stage for GenerateContent {
    fn name(&self) -> &'static str {
        GENERATE_CONTENT
    }

    async fn run(&self, mut ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let summary = ctx.summary()?.clone();
        let next_version = ctx.next_version()?.clone();
        let key = ContentCache::compute_key(&summary, &next_version, &self.ai.model);

        if let Some(path) = &self.cache_path {
            let cache = ContentCache::load(path.clone());
            if let Some(content) = cache.get(&key) {
                debug!("reusing cached AI content");
                ctx.content = Some(content);
                return Ok(ctx);
            }
        }

        let generator = ContentGenerator::new(self.model.clone(), self.ai.clone());
        let content = generator.generate(&summary, &next_version).await?;

        if let Some(path) = &self.cache_path {
            if content.source == ContentSource::Ai {
                let mut cache = ContentCache::load(path.clone());
                cache.insert(key, &content);
                if let Err(err) = cache.save() {
                    warn!(error = %err, "failed to persist content cache");
                }
            }
        }

        ctx.content = Some(content);
        Ok(ctx)
    }
}

/// Computes the path → replacement-content map without touching the
/// filesystem, so dry runs can preview the exact edits.
struct StageEdits {
    version_files: Vec<PathBuf>,
}

#[async_trait]
impl Stage for StageEdits {
    fn name(&self) -> &'static str {
        STAGE_EDITS
    }

    async fn run(&self, mut ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let next_version = ctx.next_version()?.clone();
        let content = ctx.content()?.clone();
        let mut staged = BTreeMap::new();

        for file in &self.version_files {
            let path = ctx.repo_path.join(file);
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    if let Some(updated) = files::rewrite_version(&text, &next_version) {
                        staged.insert(file.clone(), updated);
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(ReleaseError::Io(err)),
            }
        }

        let mut notes = content.release_notes.clone();
        if !notes.ends_with('\n') {
            notes.push('\n');
        }
        staged.insert(PathBuf::from(RELEASE_NOTES_FILE), notes);

        let existing_changelog =
            match tokio::fs::read_to_string(ctx.repo_path.join(CHANGELOG_FILE)).await {
                Ok(text) => Some(text),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
                Err(err) => return Err(ReleaseError::Io(err)),
            };
        let date = Utc::now().format("%Y-%m-%d").to_string();
        staged.insert(
            PathBuf::from(CHANGELOG_FILE),
            files::render_changelog(
                existing_changelog.as_deref(),
                &next_version,
                &date,
                &content.changelog_entry,
            ),
        );

        ctx.staged_edits = staged;
        Ok(ctx)
    }
}

struct CommitRelease {
    vcs: Arc<dyn VersionControlService>,
}

#[async_trait]
impl Stage for CommitRelease {
    fn name(&self) -> &'static str {
        COMMIT_RELEASE
    }

    async fn run(&self, ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let written = files::apply_edits_atomically(&ctx.repo_path, &ctx.staged_edits).await?;
        self.vcs.stage_paths(&written).await?;
        let message = format!(
            "release: bump version to {}\n\n{}",
            ctx.next_version()?,
            ctx.content()?.summary_text
        );
        self.vcs.commit(&message).await?;
        Ok(ctx)
    }
}

struct TagRelease {
    vcs: Arc<dyn VersionControlService>,
    tag_prefix: String,
}

#[async_trait]
impl Stage for TagRelease {
    fn name(&self) -> &'static str {
        TAG_RELEASE
    }

    async fn run(&self, ctx: ReleaseContext) -> ReleaseResult<ReleaseContext> {
        let version = ctx.next_version()?;
        let tag = format!("{}{version}", self.tag_prefix);
        let message = format!("Release {version}\n\n{}", ctx.content()?.summary_text);
        self.vcs.create_tag(&tag, &message).await?;
        Ok(ctx)
    }
}
