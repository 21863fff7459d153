//! Local configuration for the knowledge directory.
//!
//! A small JSON record stored at `.agp/config.json`, excluded from the
//! knowledge repository's own history by the ignore file. It remembers
//! the active session user and the submodule remote so re-runs do not
//! have to re-prompt.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::knowledge::CONFIG_FILE;

/// The persisted configuration record.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub submodule: SubmoduleConfig,
}

/// Session state: who is working and when they last started.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the active user, empty until a session starts.
    pub user: String,
    /// Timestamp of the most recent `start`.
    pub current: String,
}

/// Submodule linkage recorded at bootstrap time.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmoduleConfig {
    /// Remote URL the knowledge repository pushes to.
    pub repository: String,
    /// When the submodule linkage was last written.
    pub last_updated: String,
}

impl Config {
    /// Path of the config file under a knowledge directory.
    pub fn path(knowledge_dir: &Path) -> PathBuf {
        knowledge_dir.join(CONFIG_FILE)
    }

    /// Loads the config, treating a missing or unreadable file as empty.
    ///
    /// Parse failures are deliberately lenient: a corrupt config means
    /// "no prior config", never a hard error. Callers that require prior
    /// initialization check the knowledge directory itself instead.
    pub fn load(knowledge_dir: &Path) -> Self {
        let path = Self::path(knowledge_dir);
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::debug!(path = %path.display(), error = %e, "ignoring invalid config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Writes the config as pretty-printed JSON.
    pub fn save(&self, knowledge_dir: &Path) -> Result<()> {
        let path = Self::path(knowledge_dir);
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&path, raw)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn invalid_json_loads_default() {
        let dir = tempdir().unwrap();
        fs::write(Config::path(dir.path()), "{not json").unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let dir = tempdir().unwrap();
        let config = Config {
            session: SessionConfig {
                user: "alice".into(),
                current: "2026-08-28T10:00:00Z".into(),
            },
            submodule: SubmoduleConfig {
                repository: "git@example.com:team/knowledge.git".into(),
                last_updated: "2026-08-28T10:00:00Z".into(),
            },
        };
        config.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()), config);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.submodule.last_updated = "now".into();
        config.save(dir.path()).unwrap();

        let raw = fs::read_to_string(Config::path(dir.path())).unwrap();
        assert!(raw.contains("lastUpdated"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            Config::path(dir.path()),
            r#"{"submodule":{"repository":"https://example.com/k.git"}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path());
        assert_eq!(config.submodule.repository, "https://example.com/k.git");
        assert!(config.session.user.is_empty());
    }
}
