//! Conventional-commit classification.
//!
//! Parses each commit's first line against `<type>[(scope)][!]: <description>`
//! and aggregates the records into a [`CommitSummary`]. Deterministic:
//! identical input tuples always produce an identical summary.

use crate::domain::commit::{CommitRecord, CommitSummary, CommitType, RawCommit};

const BREAKING_FOOTERS: [&str; 2] = ["BREAKING CHANGE:", "BREAKING-CHANGE:"];

pub fn classify(raw_commits: &[RawCommit]) -> CommitSummary {
    let records = raw_commits.iter().map(classify_one).collect();
    CommitSummary::from_records(records)
}

fn classify_one(raw: &RawCommit) -> CommitRecord {
    let parsed = parse_subject(&raw.subject);
    let breaking = match &parsed {
        Some(subject) => subject.breaking || has_breaking_footer(&raw.body),
        None => has_breaking_footer(&raw.body),
    };
    let (commit_type, scope, description) = match parsed {
        Some(subject) => (subject.commit_type, subject.scope, subject.description),
        None => (CommitType::Unknown, None, raw.subject.clone()),
    };
    CommitRecord {
        hash: raw.hash.clone(),
        author: raw.author.clone(),
        timestamp: raw.timestamp,
        message: raw.subject.clone(),
        commit_type,
        scope,
        breaking,
        description,
    }
}

struct ParsedSubject {
    commit_type: CommitType,
    scope: Option<String>,
    breaking: bool,
    description: String,
}

/// `<type>[(scope)][!]: <description>` on the first line only. Anything that
/// does not match, including a malformed scope, yields `None` and the commit
/// classifies as unknown.
fn parse_subject(subject: &str) -> Option<ParsedSubject> {
    let (prefix, description) = subject.split_once(": ")?;
    let description = description.trim();
    if description.is_empty() {
        return None;
    }

    let (prefix, breaking) = match prefix.strip_suffix('!') {
        Some(rest) => (rest, true),
        None => (prefix, false),
    };

    let (type_token, scope) = match prefix.split_once('(') {
        Some((type_token, rest)) => {
            let scope = rest.strip_suffix(')')?;
            if scope.is_empty() || !scope.chars().all(is_scope_char) {
                return None;
            }
            (type_token, Some(scope.to_string()))
        }
        None => (prefix, None),
    };

    let commit_type = CommitType::parse(type_token)?;
    Some(ParsedSubject {
        commit_type,
        scope,
        breaking,
        description: description.to_string(),
    })
}

fn is_scope_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '/'
}

fn has_breaking_footer(body: &str) -> bool {
    body.lines()
        .any(|line| BREAKING_FOOTERS.iter().any(|marker| line.trim_start().starts_with(marker)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(subject: &str, body: &str) -> RawCommit {
        RawCommit {
            hash: "c0ffee1234567890".to_string(),
            author: "ada".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn parses_type_scope_and_description() {
        let summary = classify(&[raw("feat(api): add bulk endpoint", "")]);
        let record = &summary.records[0];
        assert_eq!(record.commit_type, CommitType::Feat);
        assert_eq!(record.scope.as_deref(), Some("api"));
        assert!(!record.breaking);
        assert_eq!(record.description, "add bulk endpoint");
    }

    #[test]
    fn bang_before_colon_marks_breaking() {
        let summary = classify(&[raw("feat(api)!: remove old method", "")]);
        let record = &summary.records[0];
        assert_eq!(record.commit_type, CommitType::Feat);
        assert!(record.breaking);
        assert!(summary.has_breaking);
    }

    #[test]
    fn breaking_footer_marks_breaking() {
        let summary = classify(&[raw(
            "fix: adjust defaults",
            "Some detail.\n\nBREAKING CHANGE: default port moved to 8080",
        )]);
        assert!(summary.records[0].breaking);

        let summary = classify(&[raw("fix: adjust", "BREAKING-CHANGE: also this form")]);
        assert!(summary.records[0].breaking);
    }

    #[test]
    fn footer_marks_breaking_even_on_unknown_commits() {
        let summary = classify(&[raw("rewrite everything", "BREAKING CHANGE: all of it")]);
        assert_eq!(summary.records[0].commit_type, CommitType::Unknown);
        assert!(summary.records[0].breaking);
    }

    #[test]
    fn non_matching_subjects_are_unknown() {
        for subject in [
            "update readme",
            "Feat: capitalized type",
            "perf: outside the fixed set",
            "feat(api: malformed scope",
            "feat(): empty scope",
            "feat(a b): scope with space",
            "feat:missing space",
            "feat: ",
        ] {
            let summary = classify(&[raw(subject, "")]);
            assert_eq!(
                summary.records[0].commit_type,
                CommitType::Unknown,
                "subject {subject:?} should classify as unknown"
            );
        }
    }

    #[test]
    fn unknown_commits_count_toward_total() {
        let summary = classify(&[raw("update readme", ""), raw("fix: a bug", "")]);
        assert_eq!(summary.total_commits, 2);
        assert_eq!(summary.count(CommitType::Unknown), 1);
        assert_eq!(summary.count(CommitType::Fix), 1);
    }

    #[test]
    fn classification_is_deterministic() {
        let commits = vec![
            raw("feat(core): one", ""),
            raw("fix: two", "BREAKING CHANGE: x"),
            raw("not conventional", ""),
        ];
        let first = classify(&commits);
        let second = classify(&commits);
        assert_eq!(first, second);
    }

    #[test]
    fn contributors_are_sorted_and_unique() {
        let mut a = raw("fix: one", "");
        a.author = "zoe".to_string();
        let mut b = raw("fix: two", "");
        b.author = "ada".to_string();
        let mut c = raw("fix: three", "");
        c.author = "zoe".to_string();
        let summary = classify(&[a, b, c]);
        let contributors: Vec<_> = summary.contributors.iter().cloned().collect();
        assert_eq!(contributors, vec!["ada".to_string(), "zoe".to_string()]);
    }
}
