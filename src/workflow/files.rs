//! File-facing release helpers: version discovery and rewriting, changelog
//! rendering, and atomic application of staged edits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::{ReleaseError, ReleaseResult};

// Matches `version = "1.2.3"` and `__version__ = '1.2.3'` assignments at
// line start. Only the first match in a file is treated as the project
// version, which keeps dependency tables out of the rewrite.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(?P<prefix>\s*(?:__)?version(?:__)?\s*=\s*)["'](?P<value>[^"']+)["']"#)
        .expect("version pattern compiles")
});

/// Reads the current version from the first configured file that carries a
/// recognizable version string.
pub fn read_current_version(repo_path: &Path, files: &[PathBuf]) -> ReleaseResult<Version> {
    for file in files {
        let path = repo_path.join(file);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(ReleaseError::Io(err)),
        };
        if let Some(captures) = VERSION_RE.captures(&contents) {
            let value = &captures["value"];
            return value.parse().map_err(|err| {
                ReleaseError::Configuration(format!(
                    "invalid version '{value}' in {}: {err}",
                    path.display()
                ))
            });
        }
    }
    Err(ReleaseError::RepositoryState(
        "could not determine current version from configured version files".to_string(),
    ))
}

/// Rewrites the first version assignment in `contents` to `next`. `None`
/// when the file carries no version string.
pub fn rewrite_version(contents: &str, next: &Version) -> Option<String> {
    if !VERSION_RE.is_match(contents) {
        return None;
    }
    let rewritten = VERSION_RE.replace(contents, |captures: &regex::Captures<'_>| {
        format!("{}\"{next}\"", &captures["prefix"])
    });
    Some(rewritten.into_owned())
}

/// Inserts a new changelog section after the title, before any existing
/// sections. With no existing file, synthesizes a fresh one.
pub fn render_changelog(existing: Option<&str>, version: &Version, date: &str, entry: &str) -> String {
    let new_section = format!("## [{version}] - {date}\n\n{}\n", entry.trim_end());
    let Some(existing) = existing else {
        return format!("# Changelog\n\n{new_section}");
    };

    let lines: Vec<&str> = existing.lines().collect();
    let mut insert_index = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("# ") {
            insert_index = i + 1;
            break;
        }
    }
    while insert_index < lines.len() && !lines[insert_index].starts_with("## ") {
        insert_index += 1;
    }

    let mut out: Vec<String> = lines[..insert_index].iter().map(|l| l.to_string()).collect();
    while out.last().is_some_and(|line| line.is_empty()) {
        out.pop();
    }
    if !out.is_empty() {
        out.push(String::new());
    }
    out.extend(new_section.lines().map(|l| l.to_string()));
    if insert_index < lines.len() {
        out.push(String::new());
        out.extend(lines[insert_index..].iter().map(|l| l.to_string()));
    }
    let mut rendered = out.join("\n");
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "edit".into());
    name.push(".relchain.tmp");
    path.with_file_name(name)
}

/// Writes all staged edits or none: contents go to temp files first, then
/// move into place; any failure restores the originals and removes temps.
/// Returns the repo-relative paths that were written.
pub async fn apply_edits_atomically(
    repo_path: &Path,
    edits: &BTreeMap<PathBuf, String>,
) -> ReleaseResult<Vec<PathBuf>> {
    let mut originals: Vec<(PathBuf, Option<String>)> = Vec::with_capacity(edits.len());
    for relative in edits.keys() {
        let absolute = repo_path.join(relative);
        let original = match tokio::fs::read_to_string(&absolute).await {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(ReleaseError::Io(err)),
        };
        originals.push((absolute, original));
    }

    let mut written_temps: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(edits.len());
    for (relative, contents) in edits {
        let absolute = repo_path.join(relative);
        let temp = tmp_path(&absolute);
        if let Err(err) = tokio::fs::write(&temp, contents).await {
            remove_temps(&written_temps).await;
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(ReleaseError::Io(err));
        }
        written_temps.push((temp, absolute));
    }

    for (i, (temp, absolute)) in written_temps.iter().enumerate() {
        if let Err(err) = tokio::fs::rename(temp, absolute).await {
            restore_originals(&originals[..i]).await;
            remove_temps(&written_temps[i..]).await;
            return Err(ReleaseError::Io(err));
        }
    }

    Ok(edits.keys().cloned().collect())
}

async fn remove_temps(temps: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temps {
        let _ = tokio::fs::remove_file(temp).await;
    }
}

async fn restore_originals(originals: &[(PathBuf, Option<String>)]) {
    for (path, original) in originals {
        match original {
            Some(contents) => {
                let _ = tokio::fs::write(path, contents).await;
            }
            None => {
                let _ = tokio::fs::remove_file(path).await;
            }
        }
    }
}
