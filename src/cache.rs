//! Persisted cache of AI-generated release content.
//!
//! Keys cover the exact commit set, target version, and model, so a cache
//! hit can only return content generated for the same inputs. The cache is
//! never the source of truth: a missing or corrupt file degrades to a cold
//! cache, and only AI-sourced content is stored (template output is
//! deterministic and cheap to recompute).

use std::fs;
use std::path::PathBuf;

use blake3::Hasher;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::domain::commit::CommitSummary;
use crate::domain::content::{ContentSource, GeneratedContent};
use crate::error::{ReleaseError, ReleaseResult};

const CACHE_LIMIT: usize = 32;

#[derive(Default, Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    key: String,
    release_notes: String,
    changelog_entry: String,
    summary_text: String,
}

pub struct ContentCache {
    file_path: PathBuf,
    file: CacheFile,
}

impl ContentCache {
    pub fn load(file_path: PathBuf) -> Self {
        let file = fs::read_to_string(&file_path)
            .ok()
            .and_then(|contents| serde_json::from_str::<CacheFile>(&contents).ok())
            .unwrap_or_default();
        Self { file_path, file }
    }

    pub fn get(&self, key: &str) -> Option<GeneratedContent> {
        self.file
            .entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| GeneratedContent {
                release_notes: entry.release_notes.clone(),
                changelog_entry: entry.changelog_entry.clone(),
                summary_text: entry.summary_text.clone(),
                source: ContentSource::Ai,
            })
    }

    pub fn insert(&mut self, key: String, content: &GeneratedContent) {
        if content.source != ContentSource::Ai {
            return;
        }
        self.file.entries.retain(|entry| entry.key != key);
        self.file.entries.push(CacheEntry {
            key,
            release_notes: content.release_notes.clone(),
            changelog_entry: content.changelog_entry.clone(),
            summary_text: content.summary_text.clone(),
        });

        if self.file.entries.len() > CACHE_LIMIT {
            let overflow = self.file.entries.len() - CACHE_LIMIT;
            self.file.entries.drain(0..overflow);
        }
    }

    pub fn save(&self) -> ReleaseResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.file).map_err(|err| {
            ReleaseError::Configuration(format!("failed to encode content cache: {err}"))
        })?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }

    pub fn compute_key(summary: &CommitSummary, version: &Version, model: &str) -> String {
        let mut hasher = Hasher::new();
        for record in &summary.records {
            hasher.update(record.hash.as_bytes());
            hasher.update(record.message.as_bytes());
        }
        hasher.update(version.to_string().as_bytes());
        hasher.update(model.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::domain::commit::RawCommit;
    use chrono::{TimeZone, Utc};

    fn summary(subjects: &[&str]) -> CommitSummary {
        let raws: Vec<RawCommit> = subjects
            .iter()
            .enumerate()
            .map(|(i, subject)| RawCommit {
                hash: format!("hash{i}"),
                author: "ada".to_string(),
                timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
                subject: subject.to_string(),
                body: String::new(),
            })
            .collect();
        classify(&raws)
    }

    fn ai_content() -> GeneratedContent {
        GeneratedContent {
            release_notes: "notes".to_string(),
            changelog_entry: "changelog".to_string(),
            summary_text: "summary".to_string(),
            source: ContentSource::Ai,
        }
    }

    #[test]
    fn key_is_stable_and_input_sensitive() {
        let s = summary(&["feat: one", "fix: two"]);
        let v = Version::new(1, 2, 0);
        let key_a = ContentCache::compute_key(&s, &v, "codellama:7b");
        let key_b = ContentCache::compute_key(&s, &v, "codellama:7b");
        assert_eq!(key_a, key_b);

        let other = ContentCache::compute_key(&s, &Version::new(1, 3, 0), "codellama:7b");
        assert_ne!(key_a, other);
        let other_model = ContentCache::compute_key(&s, &v, "llama3");
        assert_ne!(key_a, other_model);
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = ContentCache::load(path.clone());
        cache.insert("k1".to_string(), &ai_content());
        cache.save().unwrap();

        let reloaded = ContentCache::load(path);
        let content = reloaded.get("k1").unwrap();
        assert_eq!(content.release_notes, "notes");
        assert_eq!(content.source, ContentSource::Ai);
        assert!(reloaded.get("k2").is_none());
    }

    #[test]
    fn template_content_is_not_cached() {
        let mut cache = ContentCache::load(PathBuf::from("/nonexistent/cache.json"));
        let mut content = ai_content();
        content.source = ContentSource::Template;
        cache.insert("k1".to_string(), &content);
        assert!(cache.get("k1").is_none());
    }

    #[test]
    fn corrupt_file_degrades_to_cold_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json at all").unwrap();
        let cache = ContentCache::load(path);
        assert!(cache.get("anything").is_none());
    }

    #[test]
    fn evicts_oldest_beyond_limit() {
        let mut cache = ContentCache::load(PathBuf::from("/nonexistent/cache.json"));
        for i in 0..(CACHE_LIMIT + 4) {
            cache.insert(format!("k{i}"), &ai_content());
        }
        assert!(cache.get("k0").is_none());
        assert!(cache.get(&format!("k{}", CACHE_LIMIT + 3)).is_some());
    }
}
