//! End-to-end pipeline tests against a real git repository, with the
//! language model stubbed out.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;

use relchain::config::ReleaseConfig;
use relchain::context::AppContext;
use relchain::domain::content::ContentSource;
use relchain::domain::version::VersionBump;
use relchain::error::{ReleaseError, ReleaseResult};
use relchain::infra::git::GitCli;
use relchain::services::LanguageModelService;
use relchain::workflow::release::execute_release;
use relchain::workflow::status::release_status;

const MANIFEST: &str = "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n";

struct FailingModel;

#[async_trait]
impl LanguageModelService for FailingModel {
    async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
        Err(ReleaseError::LanguageModel("no model in tests".to_string()))
    }
}

fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn init_repo(repo: &Path) {
    git(repo, &["init", "-q"]);
    git(repo, &["config", "user.email", "ada@example.com"]);
    git(repo, &["config", "user.name", "Ada"]);
    std::fs::write(repo.join("Cargo.toml"), MANIFEST).unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", "chore: initial commit"]);
    git(repo, &["tag", "-a", "v0.1.0", "-m", "Release 0.1.0"]);
}

fn commit_file(repo: &Path, name: &str, message: &str) {
    std::fs::write(repo.join(name), message).unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-q", "-m", message]);
}

fn app(repo: &Path) -> AppContext {
    AppContext::new(
        ReleaseConfig::default(),
        Arc::new(GitCli::new(repo.to_path_buf())),
        Arc::new(FailingModel),
        None,
    )
}

#[tokio::test]
async fn dry_run_previews_without_mutating_the_repository() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo);
    commit_file(repo, "a.txt", "feat: add widget support");
    commit_file(repo, "b.txt", "fix: handle empty widget list");

    let outcome = execute_release(&app(repo), repo, None, true).await.unwrap();

    assert_eq!(outcome.version, semver::Version::new(0, 2, 0));
    assert_eq!(outcome.bump, VersionBump::Minor);
    // The model fails, so content degrades to the template path.
    assert_eq!(outcome.content.source, ContentSource::Template);
    assert!(outcome.content.release_notes.contains("add widget support"));

    // No file, commit, or tag mutations.
    assert_eq!(
        std::fs::read_to_string(repo.join("Cargo.toml")).unwrap(),
        MANIFEST
    );
    assert!(!repo.join("CHANGELOG.md").exists());
    assert!(!repo.join("release-notes.md").exists());
    assert!(!git(repo, &["tag", "-l"]).contains("v0.2.0"));
}

#[tokio::test]
async fn real_run_updates_files_commits_and_tags() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo);
    commit_file(repo, "a.txt", "feat: add widget support");

    let outcome = execute_release(&app(repo), repo, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.version, semver::Version::new(0, 2, 0));
    assert_eq!(outcome.tag, "v0.2.0");

    let manifest = std::fs::read_to_string(repo.join("Cargo.toml")).unwrap();
    assert!(manifest.contains("version = \"0.2.0\""));
    let changelog = std::fs::read_to_string(repo.join("CHANGELOG.md")).unwrap();
    assert!(changelog.starts_with("# Changelog"));
    assert!(changelog.contains("## [0.2.0]"));
    assert!(repo.join("release-notes.md").exists());

    assert!(git(repo, &["tag", "-l"]).contains("v0.2.0"));
    let subject = git(repo, &["log", "-1", "--pretty=%s"]);
    assert_eq!(subject.trim(), "release: bump version to 0.2.0");
    // The release commit staged everything it wrote.
    assert!(git(repo, &["status", "--porcelain"]).trim().is_empty());
}

#[tokio::test]
async fn second_release_inserts_above_previous_changelog_section() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo);
    commit_file(repo, "a.txt", "feat: add widget support");
    execute_release(&app(repo), repo, None, false).await.unwrap();

    commit_file(repo, "b.txt", "fix: handle empty widget list");
    let outcome = execute_release(&app(repo), repo, None, false)
        .await
        .unwrap();
    assert_eq!(outcome.version, semver::Version::new(0, 2, 1));

    let changelog = std::fs::read_to_string(repo.join("CHANGELOG.md")).unwrap();
    let newer = changelog.find("## [0.2.1]").unwrap();
    let older = changelog.find("## [0.2.0]").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn dirty_tree_blocks_a_real_run() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo);
    commit_file(repo, "a.txt", "fix: something");
    std::fs::write(repo.join("uncommitted.txt"), "scratch").unwrap();

    let err = execute_release(&app(repo), repo, None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, ReleaseError::RepositoryState(_)));
}

#[tokio::test]
async fn status_reports_pending_work() {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    init_repo(repo);
    commit_file(repo, "a.txt", "feat: add widget support");
    commit_file(repo, "b.txt", "notes without a type");

    let status = release_status(&app(repo), repo).await.unwrap();
    assert_eq!(status.current_version, semver::Version::new(0, 1, 0));
    assert_eq!(status.pending_commits, 2);
    assert_eq!(status.suggested_bump, VersionBump::Minor);
    assert!(status.ready_for_release);
    assert!(status.contributors.contains("Ada"));
}
