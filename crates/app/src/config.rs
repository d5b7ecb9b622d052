//! Settings file under the platform config directory.

use anyhow::{Context, Result};
use shared::settings::AppSettings;
use std::fs;
use std::path::{Path, PathBuf};

pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Doc Chat", "DocChat")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Settings from `path`, or defaults when the file is missing or unreadable.
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }
    match fs::read(path)
        .context("reading settings")
        .and_then(|bytes| serde_json::from_slice::<AppSettings>(&bytes).context("parsing settings"))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using default settings");
            AppSettings::default()
        }
    }
}

pub fn load_settings_or_default() -> AppSettings {
    match config_path() {
        Some(path) => load_settings_from(&path),
        None => AppSettings::default(),
    }
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn save_settings(settings: &AppSettings) {
    let Some(path) = config_path() else {
        return;
    };
    if let Err(e) = save_settings_to(&path, settings) {
        tracing::warn!(error = %e, "could not save settings");
    }
}
