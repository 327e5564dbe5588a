//! Release-notes and changelog generation.
//!
//! Primary path is the remote language model, bounded by the configured
//! timeout and retry count. Whenever that path fails (timeout, transport
//! error, or a response that fails the sanity check) and fallback is
//! enabled, a deterministic template is rendered from the same summary
//! instead. The result always records which path produced it.

use std::sync::Arc;

use semver::Version;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::domain::commit::{CommitSummary, CommitType};
use crate::domain::content::{ContentSource, GeneratedContent};
use crate::error::{ReleaseError, ReleaseResult};
use crate::services::LanguageModelService;

const MIN_RESPONSE_LEN: usize = 8;
const PROMPT_COMMIT_LIMIT: usize = 15;

pub struct ContentGenerator {
    model: Arc<dyn LanguageModelService>,
    config: AiConfig,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModelService>, config: AiConfig) -> Self {
        Self { model, config }
    }

    pub async fn generate(
        &self,
        summary: &CommitSummary,
        next_version: &Version,
    ) -> ReleaseResult<GeneratedContent> {
        if !self.config.enabled {
            debug!("AI generation disabled, rendering template content");
            return Ok(template_content(summary));
        }

        match self.try_model(summary, next_version).await {
            Ok(content) => Ok(content),
            Err(err) if self.config.fallback_on_error => {
                warn!(error = %err, "AI generation failed, falling back to template content");
                Ok(template_content(summary))
            }
            Err(err) => Err(ReleaseError::ContentGeneration(err.to_string())),
        }
    }

    async fn try_model(
        &self,
        summary: &CommitSummary,
        next_version: &Version,
    ) -> ReleaseResult<GeneratedContent> {
        let release_notes = self
            .complete_bounded(&release_notes_prompt(summary))
            .await?;
        let changelog_entry = self
            .complete_bounded(&changelog_prompt(summary, next_version))
            .await?;
        let summary_text = self.complete_bounded(&summary_prompt(summary)).await?;
        Ok(GeneratedContent {
            release_notes,
            changelog_entry,
            summary_text,
            source: ContentSource::Ai,
        })
    }

    /// One model call under the configured timeout, retried up to
    /// `max_retries` extra times with no backoff.
    async fn complete_bounded(&self, prompt: &str) -> ReleaseResult<String> {
        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!(attempt, "retrying language model call");
            }
            let outcome =
                match tokio::time::timeout(self.config.timeout(), self.model.complete(prompt))
                    .await
                {
                    Ok(Ok(raw)) => {
                        let text = clean_response(&raw);
                        if text.len() >= MIN_RESPONSE_LEN {
                            return Ok(text);
                        }
                        Err(ReleaseError::LanguageModel(
                            "response failed sanity check".to_string(),
                        ))
                    }
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ReleaseError::LanguageModel(format!(
                        "call timed out after {}s",
                        self.config.timeout_secs
                    ))),
                };
            match outcome {
                Ok(text) => return Ok(text),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error
            .unwrap_or_else(|| ReleaseError::LanguageModel("no attempts were made".to_string())))
    }
}

fn release_notes_prompt(summary: &CommitSummary) -> String {
    let mut prompt = format!(
        "You are a technical writer creating user-facing release notes.\n\n\
         Commit analysis:\n\
         - Total commits: {}\n\
         - Features: {}\n\
         - Bug fixes: {}\n\
         - Breaking changes: {}\n\n\
         Recent commits:\n",
        summary.total_commits,
        summary.count(CommitType::Feat),
        summary.count(CommitType::Fix),
        summary.breaking_records().count(),
    );
    for record in summary.records.iter().take(PROMPT_COMMIT_LIMIT) {
        prompt.push_str(&format!(
            "- [{}] {}\n",
            record.commit_type.as_str(),
            record.message
        ));
    }
    prompt.push_str(
        "\nGroup changes by user impact (New Features, Improvements, Bug Fixes, \
         Breaking Changes), use clear benefit-focused language, and include \
         migration notes for breaking changes. Format as clean Markdown without \
         version numbers or dates.\n",
    );
    prompt
}

fn changelog_prompt(summary: &CommitSummary, version: &Version) -> String {
    let mut prompt = format!(
        "You are creating a technical changelog entry for version {version}.\n\n\
         Commits by category:\n"
    );
    for commit_type in CommitType::RECOGNIZED {
        let mut records = summary.records_of(commit_type).peekable();
        if records.peek().is_none() {
            continue;
        }
        prompt.push_str(&format!("\n{}:\n", commit_type.heading().to_uppercase()));
        for record in records {
            let scope = record
                .scope
                .as_deref()
                .map(|s| format!("({s})"))
                .unwrap_or_default();
            let bang = if record.breaking { "!" } else { "" };
            prompt.push_str(&format!(
                "- {}{scope}{bang}: {}\n",
                record.commit_type.as_str(),
                record.description
            ));
        }
    }
    prompt.push_str(
        "\nGenerate a precise, developer-focused changelog entry in Markdown, \
         listing breaking changes prominently. Do not include a version header.\n",
    );
    prompt
}

fn summary_prompt(summary: &CommitSummary) -> String {
    let mut prompt = String::from("Summarize these commits in 2-3 sentences:\n\n");
    for record in summary.records.iter().take(PROMPT_COMMIT_LIMIT) {
        prompt.push_str(&format!("- {}\n", record.message));
    }
    prompt.push_str("\nFocus on the main themes and improvements.");
    prompt
}

/// Strips surrounding code fences and whitespace from a model response.
fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = match rest.rsplit_once('\n') {
            Some((body, _)) => body,
            None => rest,
        };
    }
    text.trim().to_string()
}

fn template_content(summary: &CommitSummary) -> GeneratedContent {
    GeneratedContent {
        release_notes: template_release_notes(summary),
        changelog_entry: template_changelog(summary),
        summary_text: template_summary_text(summary),
        source: ContentSource::Template,
    }
}

/// Deterministic release notes: breaking changes first under an explicit
/// heading, then one bullet per record grouped by type.
pub fn template_release_notes(summary: &CommitSummary) -> String {
    let mut notes = String::from("## What's New\n\n");

    if summary.has_breaking {
        notes.push_str("### Breaking Changes\n\n");
        for record in summary.breaking_records() {
            notes.push_str(&format!("- {}\n", record.message));
        }
        notes.push('\n');
    }

    for commit_type in CommitType::RECOGNIZED {
        let mut records = summary
            .records_of(commit_type)
            .filter(|record| !record.breaking)
            .peekable();
        if records.peek().is_none() {
            continue;
        }
        notes.push_str(&format!("### {}\n\n", commit_type.heading()));
        for record in records {
            notes.push_str(&format!("- {}\n", record.description));
        }
        notes.push('\n');
    }

    notes.push_str(&format!(
        "This release includes {} commits from {} contributors.\n",
        summary.total_commits,
        summary.contributors.len()
    ));
    notes
}

/// Deterministic changelog section body, without a version header.
pub fn template_changelog(summary: &CommitSummary) -> String {
    let mut changelog = String::new();

    if summary.has_breaking {
        changelog.push_str("### Breaking Changes\n\n");
        for record in summary.breaking_records() {
            changelog.push_str(&format!("- {}\n", record.message));
        }
        changelog.push('\n');
    }

    let sections: [(&str, CommitType); 4] = [
        ("Added", CommitType::Feat),
        ("Fixed", CommitType::Fix),
        ("Changed", CommitType::Refactor),
        ("Documentation", CommitType::Docs),
    ];
    for (heading, commit_type) in sections {
        let mut records = summary
            .records_of(commit_type)
            .filter(|record| !record.breaking)
            .peekable();
        if records.peek().is_none() {
            continue;
        }
        changelog.push_str(&format!("### {heading}\n\n"));
        for record in records {
            changelog.push_str(&format!("- {}\n", record.description));
        }
        changelog.push('\n');
    }

    if changelog.is_empty() {
        changelog.push_str("No notable changes.\n");
    }
    changelog.trim_end().to_string()
}

pub fn template_summary_text(summary: &CommitSummary) -> String {
    if summary.is_empty() {
        return "No significant changes in this release.".to_string();
    }

    let mut parts = Vec::new();
    let features = summary.count(CommitType::Feat);
    let fixes = summary.count(CommitType::Fix);
    let docs = summary.count(CommitType::Docs);
    if features > 0 {
        parts.push(format!("{features} new features"));
    }
    if fixes > 0 {
        parts.push(format!("{fixes} bug fixes"));
    }
    if docs > 0 {
        parts.push(format!("{docs} documentation updates"));
    }

    let detail = if parts.is_empty() {
        "various improvements and updates".to_string()
    } else {
        parts.join(", ")
    };
    format!(
        "This release includes {} commits with {detail}.",
        summary.total_commits
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::domain::commit::RawCommit;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn raw(subject: &str) -> RawCommit {
        RawCommit {
            hash: "deadbeef00000000".to_string(),
            author: "ada".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 10, 8, 0, 0).unwrap(),
            subject: subject.to_string(),
            body: String::new(),
        }
    }

    fn summary() -> CommitSummary {
        classify(&[
            raw("feat(api)!: remove old method"),
            raw("feat(core): add pipeline"),
            raw("fix(core): handle empty input"),
            raw("docs: update readme"),
        ])
    }

    struct StaticModel(&'static str);

    #[async_trait]
    impl LanguageModelService for StaticModel {
        async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModelService for FailingModel {
        async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
            Err(ReleaseError::LanguageModel("connection refused".to_string()))
        }
    }

    struct SlowModel;

    #[async_trait]
    impl LanguageModelService for SlowModel {
        async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("never returned".to_string())
        }
    }

    struct CountingModel(AtomicU32);

    #[async_trait]
    impl LanguageModelService for CountingModel {
        async fn complete(&self, _prompt: &str) -> ReleaseResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ReleaseError::LanguageModel("still failing".to_string()))
        }
    }

    fn config() -> AiConfig {
        AiConfig::default()
    }

    #[tokio::test]
    async fn successful_model_yields_ai_source() {
        let generator = Arc::new(StaticModel("A release with plenty of improvements."));
        let generator = ContentGenerator::new(generator, config());
        let content = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap();
        assert_eq!(content.source, ContentSource::Ai);
        assert!(!content.release_notes.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_template() {
        let generator = ContentGenerator::new(Arc::new(FailingModel), config());
        let content = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap();
        assert_eq!(content.source, ContentSource::Template);
        assert!(!content.release_notes.is_empty());
        assert!(!content.changelog_entry.is_empty());
        assert!(!content.summary_text.is_empty());
    }

    #[tokio::test]
    async fn failure_without_fallback_is_fatal() {
        let mut cfg = config();
        cfg.fallback_on_error = false;
        let generator = ContentGenerator::new(Arc::new(FailingModel), cfg);
        let err = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::ContentGeneration(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back_to_template() {
        let mut cfg = config();
        cfg.timeout_secs = 1;
        let generator = ContentGenerator::new(Arc::new(SlowModel), cfg);
        let content = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap();
        assert_eq!(content.source, ContentSource::Template);
    }

    #[tokio::test]
    async fn short_response_fails_sanity_check_and_falls_back() {
        let generator = ContentGenerator::new(Arc::new(StaticModel("ok")), config());
        let content = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap();
        assert_eq!(content.source, ContentSource::Template);
    }

    #[tokio::test]
    async fn retries_exactly_the_configured_count() {
        let model = Arc::new(CountingModel(AtomicU32::new(0)));
        let mut cfg = config();
        cfg.max_retries = 2;
        let generator = ContentGenerator::new(model.clone(), cfg);
        let _ = generator.generate(&summary(), &Version::new(2, 0, 0)).await;
        // First prompt only: 1 initial attempt + 2 retries before fallback.
        assert_eq!(model.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn disabled_ai_renders_template_without_calling_model() {
        let model = Arc::new(CountingModel(AtomicU32::new(0)));
        let mut cfg = config();
        cfg.enabled = false;
        let generator = ContentGenerator::new(model.clone(), cfg);
        let content = generator
            .generate(&summary(), &Version::new(2, 0, 0))
            .await
            .unwrap();
        assert_eq!(content.source, ContentSource::Template);
        assert_eq!(model.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn template_lists_breaking_changes_first() {
        let notes = template_release_notes(&summary());
        let breaking_pos = notes.find("### Breaking Changes").unwrap();
        let features_pos = notes.find("### Features").unwrap();
        assert!(breaking_pos < features_pos);
        assert!(notes.contains("- feat(api)!: remove old method"));
    }

    #[test]
    fn template_output_is_deterministic() {
        let s = summary();
        assert_eq!(template_release_notes(&s), template_release_notes(&s));
        assert_eq!(template_changelog(&s), template_changelog(&s));
        assert_eq!(template_summary_text(&s), template_summary_text(&s));
    }

    #[test]
    fn changelog_groups_by_section() {
        let changelog = template_changelog(&summary());
        assert!(changelog.contains("### Added"));
        assert!(changelog.contains("### Fixed"));
        assert!(changelog.contains("### Documentation"));
        assert!(changelog.contains("- add pipeline"));
    }

    #[test]
    fn clean_response_strips_fences() {
        assert_eq!(clean_response("```markdown\nhello world\n```"), "hello world");
        assert_eq!(clean_response("  plain text  "), "plain text");
    }
}
