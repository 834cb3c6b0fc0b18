//! Error taxonomy for loading configuration from a bucket

use std::path::PathBuf;
use thiserror::Error;

/// Failure while talking to the bucket or moving bytes out of it.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Bucket configuration error: {0}")]
    Config(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start transfer runtime: {0}")]
    Runtime(String),
}

/// Failure while parsing downloaded content into the config store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed reading config source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed reading config stream: {0}")]
    Stream(#[source] std::io::Error),

    #[error("Config source is not valid UTF-8")]
    Encoding,

    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Invalid {format} config: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Top-level {format} value must be a mapping")]
    NotAMapping { format: &'static str },
}

/// Error returned by [`crate::load_from_source`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// Malformed URI or bucket name. Never suppressed by `silent`.
    #[error("Invalid S3 path")]
    InvalidLocation(String),

    /// The location names a bucket but no object. Never suppressed by `silent`.
    #[error("Empty filename")]
    EmptyFilename,

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl SourceError {
    /// Whether `silent` mode turns this error into a `false` return.
    ///
    /// Load errors are handled by the loader's own `silent` flag before they
    /// get here, so only transfer failures qualify.
    pub fn is_suppressible(&self) -> bool {
        matches!(self, SourceError::Transfer(_))
    }
}

/// Failure while reading the tool's own settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed reading settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Unsupported settings extension '.{extension}' for file {path}")]
    UnsupportedExtension { extension: String, path: PathBuf },
}
