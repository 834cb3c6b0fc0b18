//! Default cache file locations.

use crate::location::Location;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Cache path for `location` under `root`, or under the platform cache directory.
///
/// Layout: `<root>/config-source/<digest>/<file name>`. The digest keeps
/// objects with the same file name in different buckets or prefixes apart,
/// and the file name keeps the extension for format detection.
pub fn default_cache_path(location: &Location, root: Option<&Path>) -> Option<PathBuf> {
    let base = match root {
        Some(dir) => dir.to_path_buf(),
        None => cache_root_dir()?,
    };
    Some(base.join("config-source").join(cache_key(location)).join(location.file_name()))
}

pub fn cache_key(location: &Location) -> String {
    let mut hasher = Sha256::new();
    hasher.update(location.bucket.as_bytes());
    hasher.update("\n");
    hasher.update(location.key.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

pub fn cache_root_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache"))
    }
}
