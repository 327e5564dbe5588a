use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commit as read from the version-control backend, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub body: String,
}

/// The recognized conventional-commit types. First lines that do not match
/// the grammar, or use a type outside this set, classify as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Test,
    Chore,
    Unknown,
}

impl CommitType {
    /// The recognized types, in the order headings appear in generated content.
    pub const RECOGNIZED: [CommitType; 7] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
    ];

    /// Case-sensitive match against the recognized set.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "feat" => Some(CommitType::Feat),
            "fix" => Some(CommitType::Fix),
            "docs" => Some(CommitType::Docs),
            "style" => Some(CommitType::Style),
            "refactor" => Some(CommitType::Refactor),
            "test" => Some(CommitType::Test),
            "chore" => Some(CommitType::Chore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
            CommitType::Unknown => "unknown",
        }
    }

    /// Section heading used in release notes and changelog entries.
    pub fn heading(&self) -> &'static str {
        match self {
            CommitType::Feat => "Features",
            CommitType::Fix => "Bug Fixes",
            CommitType::Docs => "Documentation",
            CommitType::Style => "Styling",
            CommitType::Refactor => "Code Refactoring",
            CommitType::Test => "Tests",
            CommitType::Chore => "Chores",
            CommitType::Unknown => "Other Changes",
        }
    }
}

/// A classified commit. Created once during classification, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
}

impl CommitRecord {
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(8);
        &self.hash[..end]
    }
}

/// Aggregate over an ordered sequence of classified commits. Counts are
/// consistent sums over `records`; `has_breaking` is true iff at least one
/// record is breaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub total_commits: usize,
    pub counts: BTreeMap<CommitType, usize>,
    pub has_breaking: bool,
    pub contributors: BTreeSet<String>,
    pub records: Vec<CommitRecord>,
}

impl CommitSummary {
    pub fn from_records(records: Vec<CommitRecord>) -> Self {
        let mut counts: BTreeMap<CommitType, usize> = BTreeMap::new();
        let mut contributors = BTreeSet::new();
        let mut has_breaking = false;
        for record in &records {
            *counts.entry(record.commit_type).or_default() += 1;
            contributors.insert(record.author.clone());
            has_breaking |= record.breaking;
        }
        Self {
            total_commits: records.len(),
            counts,
            has_breaking,
            contributors,
            records,
        }
    }

    pub fn count(&self, commit_type: CommitType) -> usize {
        self.counts.get(&commit_type).copied().unwrap_or(0)
    }

    pub fn records_of(&self, commit_type: CommitType) -> impl Iterator<Item = &CommitRecord> {
        self.records
            .iter()
            .filter(move |record| record.commit_type == commit_type)
    }

    pub fn breaking_records(&self) -> impl Iterator<Item = &CommitRecord> {
        self.records.iter().filter(|record| record.breaking)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
