//! Configuration module
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first settings file found, falling back to defaults.
///
/// `SEARXNG_SETTINGS_PATH` wins over the default locations. Environment
/// variables are merged on top in every case.
pub fn load() -> Result<Settings> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("SEARXNG_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from("settings.yml"));
    candidates.push(PathBuf::from("config/settings.yml"));
    candidates.push(PathBuf::from("/etc/searxng/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("searxng-func/settings.yml"));
    }

    let mut settings = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };
    settings.merge_env();
    Ok(settings)
}
