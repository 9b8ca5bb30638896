use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use passhash::HashConfig;

const CONFIG_FILE: &str = "config.toml";

fn default_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "passhash", "passhash")?;

    Some(dirs.config_dir().join(CONFIG_FILE))
}

async fn read(path: &Path) -> Result<HashConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read config file {}", path.display()))?;

    toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Reads the explicit config file, or the one in the user config directory if present.
pub async fn load(explicit: Option<PathBuf>) -> Result<HashConfig> {
    if let Some(path) = explicit {
        return read(&path).await;
    }

    match default_path() {
        Some(path) if path.exists() => {
            log::debug!("Using config file {}", path.display());
            read(&path).await
        }
        _ => {
            log::warn!("No config file found, using default hashers");
            Ok(HashConfig::default())
        }
    }
}
