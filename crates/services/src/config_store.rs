//! Provider configuration file (`~/.shandu/config.json`).
//!
//! The whole file is rewritten on every edit; there is no locking or
//! versioning, the last write wins.

use anyhow::{Context, Result};
use shared::settings::ResearchConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default per-user location.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".shandu")
            .join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config. A missing file is created with defaults; an unreadable
    /// or malformed one is left alone and defaults are returned.
    pub fn load(&self) -> ResearchConfig {
        if !self.path.exists() {
            let config = ResearchConfig::default();
            if let Err(e) = self.save(&config) {
                tracing::warn!("could not write default config: {:#}", e);
            }
            return config;
        }

        match self.read() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring unreadable config {}: {:#}", self.path.display(), e);
                ResearchConfig::default()
            }
        }
    }

    fn read(&self) -> Result<ResearchConfig> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let config = serde_json::from_slice(&bytes).context("parsing config JSON")?;
        Ok(config)
    }

    pub fn save(&self, config: &ResearchConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        tracing::debug!("saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::settings::OLLAMA;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.json"));
        let config = store.load();
        assert_eq!(config, ResearchConfig::default());
        assert!(store.path().exists());
    }

    #[test]
    fn test_round_trip_keeps_edits() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let mut config = store.load();
        config.set_credentials(OLLAMA, "", "http://10.1.1.1:11434");
        config
            .add_custom_provider("Local GW", "http://gw/v1", "key", vec!["m1".into()])
            .unwrap();
        store.save(&config).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded, config);
        assert_eq!(reloaded.active_provider, OLLAMA);
    }

    #[test]
    fn test_malformed_file_falls_back_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);
        assert_eq!(store.load(), ResearchConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
