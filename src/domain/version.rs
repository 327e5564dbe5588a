use semver::Version;
use serde::{Deserialize, Serialize};

use crate::domain::commit::{CommitSummary, CommitType};
use crate::error::{ReleaseError, ReleaseResult};

/// Version bump magnitude, totally ordered `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    None,
    Patch,
    Minor,
    Major,
}

impl VersionBump {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "none" => Some(VersionBump::None),
            "patch" => Some(VersionBump::Patch),
            "minor" => Some(VersionBump::Minor),
            "major" => Some(VersionBump::Major),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionBump::None => "none",
            VersionBump::Patch => "patch",
            VersionBump::Minor => "minor",
            VersionBump::Major => "major",
        }
    }

    /// Standard semver arithmetic; no special-casing for 0.x versions.
    /// Pre-release and build metadata are dropped from the result.
    pub fn apply(&self, current: &Version) -> Version {
        let mut next = Version::new(current.major, current.minor, current.patch);
        match self {
            VersionBump::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            VersionBump::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            VersionBump::Patch => {
                next.patch += 1;
            }
            VersionBump::None => {}
        }
        next
    }
}

impl std::fmt::Display for VersionBump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bump suggested by the commit summary. Breaking changes win outright, then
/// features, then any other recognized type. Unknown commits never bump.
pub fn suggest_bump(summary: &CommitSummary) -> VersionBump {
    if summary.has_breaking {
        VersionBump::Major
    } else if summary.count(CommitType::Feat) > 0 {
        VersionBump::Minor
    } else if summary
        .records
        .iter()
        .any(|record| record.commit_type != CommitType::Unknown)
    {
        VersionBump::Patch
    } else {
        VersionBump::None
    }
}

/// Computes the next version. An explicit override wins unconditionally but
/// the result must still strictly exceed `current`.
pub fn next_version(
    current: &Version,
    summary: &CommitSummary,
    requested: Option<VersionBump>,
) -> ReleaseResult<(Version, VersionBump)> {
    let bump = match requested {
        Some(bump) => bump,
        None => {
            let suggested = suggest_bump(summary);
            if suggested == VersionBump::None {
                return Err(ReleaseError::NoReleasableChanges);
            }
            suggested
        }
    };

    let next = bump.apply(current);
    if next <= *current {
        return Err(ReleaseError::VersionRegression {
            current: current.clone(),
            next,
        });
    }
    Ok((next, bump))
}
