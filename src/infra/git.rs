//! Version control through the system git binary.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;

use crate::domain::commit::RawCommit;
use crate::error::{ReleaseError, ReleaseResult};
use crate::services::VersionControlService;

// Unit/record separators keep parsing unambiguous even when subjects or
// bodies contain pipes or newlines.
const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';
const LOG_FORMAT: &str = "--pretty=format:%H%x1f%an%x1f%aI%x1f%s%x1f%b%x1e";

pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    pub fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }

    async fn git(&self, args: &[&str]) -> ReleaseResult<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .await
            .map_err(|err| ReleaseError::VersionControl(format!("failed to run git: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::VersionControl(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or(""),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Like `git`, but a non-zero exit is an expected miss rather than an
    /// error (e.g. `describe` with no tags).
    async fn git_optional(&self, args: &[&str]) -> ReleaseResult<Option<String>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .await
            .map_err(|err| ReleaseError::VersionControl(format!("failed to run git: {err}")))?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            Ok(None)
        }
    }

    async fn assert_repository(&self) -> ReleaseResult<()> {
        self.git(&["rev-parse", "--git-dir"]).await.map_err(|_| {
            ReleaseError::RepositoryState(format!(
                "{} is not a git repository",
                self.repo_path.display()
            ))
        })?;
        Ok(())
    }

    fn parse_log(output: &str) -> ReleaseResult<Vec<RawCommit>> {
        let mut commits = Vec::new();
        for block in output.split(RECORD_SEP) {
            let block = block.trim_matches(['\n', ' ']);
            if block.is_empty() {
                continue;
            }
            let mut fields = block.splitn(5, FIELD_SEP);
            let (hash, author, date, subject, body) = (
                fields.next(),
                fields.next(),
                fields.next(),
                fields.next(),
                fields.next(),
            );
            let (Some(hash), Some(author), Some(date), Some(subject)) =
                (hash, author, date, subject)
            else {
                return Err(ReleaseError::VersionControl(
                    "unexpected git log record shape".to_string(),
                ));
            };
            let timestamp = DateTime::parse_from_rfc3339(date.trim())
                .map_err(|err| {
                    ReleaseError::VersionControl(format!("invalid commit date '{date}': {err}"))
                })?
                .with_timezone(&Utc);
            commits.push(RawCommit {
                hash: hash.trim().to_string(),
                author: author.trim().to_string(),
                timestamp,
                subject: subject.trim().to_string(),
                body: body.unwrap_or_default().trim().to_string(),
            });
        }
        Ok(commits)
    }
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn last_release_tag(&self) -> ReleaseResult<Option<String>> {
        self.assert_repository().await?;
        let described = self
            .git_optional(&["describe", "--tags", "--abbrev=0"])
            .await?;
        Ok(described
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty()))
    }

    async fn commits_since(&self, last_tag: Option<&str>) -> ReleaseResult<Vec<RawCommit>> {
        self.assert_repository().await?;
        let range = last_tag.map(|tag| format!("{tag}..HEAD"));
        let mut args = vec!["log"];
        if let Some(range) = &range {
            args.push(range);
        }
        args.push(LOG_FORMAT);

        match self.git(&args).await {
            Ok(output) => Self::parse_log(&output),
            // A log over the full history only fails when there is nothing
            // to log at all.
            Err(_) if last_tag.is_none() => Err(ReleaseError::RepositoryState(format!(
                "{} has no commits",
                self.repo_path.display()
            ))),
            Err(err) => Err(err),
        }
    }

    async fn is_clean(&self) -> ReleaseResult<bool> {
        self.assert_repository().await?;
        let status = self.git(&["status", "--porcelain"]).await?;
        Ok(status.trim().is_empty())
    }

    async fn stage_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
        for path in paths {
            let path = path.to_string_lossy().into_owned();
            self.git(&["add", "--", &path]).await?;
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> ReleaseResult<()> {
        self.git(&["commit", "-m", message]).await?;
        Ok(())
    }

    async fn create_tag(&self, name: &str, message: &str) -> ReleaseResult<()> {
        self.git(&["tag", "-a", name, "-m", message]).await?;
        Ok(())
    }
}
