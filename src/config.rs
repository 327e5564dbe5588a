use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReleaseError, ReleaseResult};

const PROJECT_CONFIG_FILE: &str = "relchain.json";
const USER_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    pub ai: AiConfig,
    pub git: GitConfig,
    pub version: VersionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// When false, content generation goes straight to the template renderer.
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    /// Extra attempts after the first failed call. No backoff between them.
    pub max_retries: u32,
    /// When true, remote failures degrade to template content instead of
    /// failing the run.
    pub fallback_on_error: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:11434".to_string(),
            model: "codellama:7b".to_string(),
            timeout_secs: 30,
            max_tokens: 2000,
            max_retries: 0,
            fallback_on_error: true,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Prepended to the computed version to form the release tag.
    pub tag_prefix: String,
    pub require_clean_working_tree: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            tag_prefix: "v".to_string(),
            require_clean_working_tree: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Files whose version strings are rewritten as part of the staged edits.
    /// The first file with a recognizable version also defines the current
    /// version.
    pub files: Vec<PathBuf>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            files: vec![PathBuf::from("Cargo.toml")],
        }
    }
}

impl ReleaseConfig {
    /// Loads the project-local config if present, otherwise the stored user
    /// config, otherwise defaults. Unknown keys are ignored; missing keys
    /// take their defaults.
    pub fn load(repo_path: &Path) -> ReleaseResult<Self> {
        let candidates = [repo_path.join(PROJECT_CONFIG_FILE), config_file_path()?];
        for path in candidates {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    return serde_json::from_str(&contents).map_err(|err| {
                        ReleaseError::Configuration(format!(
                            "invalid config file {}: {err}",
                            path.display()
                        ))
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(ReleaseError::Io(err)),
            }
        }
        Ok(Self::default())
    }

    /// Loads only the stored user config, ignoring any project-local file.
    pub fn load_stored() -> ReleaseResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                ReleaseError::Configuration(format!(
                    "invalid config file {}: {err}",
                    path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ReleaseError::Io(err)),
        }
    }

    /// Saves to the stored user config file.
    pub fn save(&self) -> ReleaseResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self).map_err(|err| {
            ReleaseError::Configuration(format!("failed to encode config: {err}"))
        })?;
        fs::write(&path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> ReleaseResult<PathBuf> {
    if let Ok(dir) = env::var("RELCHAIN_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = env::var("HOME").map_err(|_| {
        ReleaseError::Configuration("cannot determine config directory (HOME unset)".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("relchain"))
}

pub fn config_file_path() -> ReleaseResult<PathBuf> {
    Ok(config_directory()?.join(USER_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ReleaseConfig::default();
        assert!(config.ai.enabled);
        assert!(config.ai.fallback_on_error);
        assert_eq!(config.ai.max_retries, 0);
        assert_eq!(config.ai.timeout_secs, 30);
        assert_eq!(config.git.tag_prefix, "v");
        assert!(config.git.require_clean_working_tree);
        assert_eq!(config.version.files, vec![PathBuf::from("Cargo.toml")]);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ReleaseConfig =
            serde_json::from_str(r#"{"ai": {"fallback_on_error": false}}"#).unwrap();
        assert!(!config.ai.fallback_on_error);
        assert_eq!(config.ai.endpoint, "http://localhost:11434");
        assert_eq!(config.git.tag_prefix, "v");
    }
}
