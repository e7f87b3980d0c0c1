use anyhow::{Context, Result};
use lstree_tui::DEFAULT_OVERSCAN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lstree-tui";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config_version: u32,
    pub keymap: String,
    pub default_revision: String,
    pub overscan: usize,
    pub auto_preview: bool,
    pub expand_all_on_load: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            keymap: "vim".to_string(),
            default_revision: "HEAD".to_string(),
            overscan: DEFAULT_OVERSCAN,
            auto_preview: true,
            expand_all_on_load: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_or_default() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let parsed = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        Ok(parsed)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = config_path()?;
        ensure_parent_dir(&path)?;

        let body = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, body)
            .with_context(|| format!("failed to write config: {}", path.display()))?;

        Ok(path)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not resolve config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

pub fn log_path() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("could not resolve cache directory")?;
    Ok(base.join(APP_DIR).join("lstree-tui.log"))
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
