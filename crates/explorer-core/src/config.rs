use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable Android sets to the primary external storage path
pub const EXTERNAL_STORAGE_ENV: &str = "EXTERNAL_STORAGE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Directory treated as the external storage root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,

    /// Create the storage root if it does not exist yet
    #[serde(default)]
    pub create_root: bool,
}

impl ExplorerConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "file-explorer", "explorer") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("explorer-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// The storage root to use: the configured one, else `$EXTERNAL_STORAGE`,
    /// else the user's home directory.
    pub fn resolved_root(&self) -> PathBuf {
        if let Some(root) = &self.storage_root {
            return root.clone();
        }
        if let Some(env_root) = std::env::var_os(EXTERNAL_STORAGE_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(env_root);
        }
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
