use serde::{Deserialize, Serialize};

/// Where the generated text came from. Always populated so callers can audit
/// AI-sourced against template-sourced content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Ai,
    Template,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Ai => "ai",
            ContentSource::Template => "template",
        }
    }
}

/// Release documentation produced for one run: user-facing notes, the
/// changelog section body, and a short prose summary used in the release
/// commit and tag messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub release_notes: String,
    pub changelog_entry: String,
    pub summary_text: String,
    pub source: ContentSource,
}
