//! Settings file loading

use super::Settings;
use crate::error::SettingsError;
use std::fs;
use std::path::{Path, PathBuf};

const CANDIDATES: &[&str] =
    &["config-source.toml", ".config-source.toml", "config-source.yaml", ".config-source.yml"];

const SECTION: &str = "config-source";

/// Load settings from `explicit_path`, or from the first settings file found in `dir`.
///
/// Problems with an explicitly given file are errors. An auto-discovered file
/// that cannot be read or parsed is skipped with a warning.
pub fn load_settings(dir: &Path, explicit_path: Option<&Path>) -> Result<Settings, SettingsError> {
    let path_provided = explicit_path.is_some();

    let discovered = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_settings(dir),
    };

    let Some(settings_file) = discovered else {
        return Ok(Settings::default());
    };

    match read_settings(&settings_file) {
        Ok(settings) => {
            tracing::debug!("Loaded settings from {}", settings_file.display());
            Ok(settings)
        }
        Err(e) if path_provided => Err(e),
        Err(e) => {
            tracing::warn!(
                "Ignoring auto-discovered settings {}: {}",
                settings_file.display(),
                e
            );
            Ok(Settings::default())
        }
    }
}

fn discover_settings(dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path)
        .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let invalid = |message: String| SettingsError::Invalid { path: path.to_path_buf(), message };

    match ext.as_str() {
        "toml" => {
            let raw: toml::Value = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
            let value = if let Some(nested) = raw.get(SECTION) { nested.clone() } else { raw };
            value.try_into().map_err(|e: toml::de::Error| invalid(e.to_string()))
        }
        "yaml" | "yml" => {
            if content.trim().is_empty() {
                return Ok(Settings::default());
            }
            let raw: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?;
            let value = if let Some(nested) = raw.get(SECTION) { nested.clone() } else { raw };
            serde_yaml::from_value(value).map_err(|e| invalid(e.to_string()))
        }
        other => Err(SettingsError::UnsupportedExtension {
            extension: other.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

/// Apply `CONFIG_SOURCE_*` environment variables on top of file settings.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(endpoint) = lookup("CONFIG_SOURCE_ENDPOINT") {
        settings.s3.endpoint = Some(endpoint);
    }
    if let Some(region) = lookup("CONFIG_SOURCE_REGION") {
        settings.s3.region = Some(region);
    }
    if let Some(dir) = lookup("CONFIG_SOURCE_CACHE_DIR") {
        settings.cache.dir = Some(PathBuf::from(dir));
    }
}
