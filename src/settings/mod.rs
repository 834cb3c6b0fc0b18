//! Settings for the tool itself
//!
//! Bucket connection details and cache defaults, loaded from a settings file
//! and environment variables with precedence CLI > Env > File > Defaults.

pub mod loader;

use serde::Deserialize;
use std::path::PathBuf;

pub use loader::{apply_env_overrides, load_settings};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub s3: S3Settings,
    pub cache: CacheSettings,
}

/// Connection settings for [`crate::bucket::S3Provider`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Settings {
    /// Custom endpoint for S3-compatible services, e.g. `http://localhost:9000`.
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub allow_http: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Root for derived cache paths; the platform cache directory when unset.
    pub dir: Option<PathBuf>,
    /// Always refresh cache files from the bucket.
    pub update: bool,
}
