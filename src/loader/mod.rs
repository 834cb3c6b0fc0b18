//! Config loading and merging
//!
//! Turns downloaded bytes (in memory or in a cache file) into key/value pairs
//! and merges them into a [`ConfigStore`].

pub mod pyfile;

use crate::error::LoadError;
use crate::store::{ConfigStore, MergeStrategy};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Content format of a config object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Python-style `NAME = literal` assignments; only UPPERCASE names are exported.
    #[default]
    PyFile,
    Json,
    Toml,
    Yaml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::PyFile => "pyfile",
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Yaml => "yaml",
        }
    }

    /// Guess the format from a file or key extension.
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" => Some(Format::PyFile),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pyfile" | "py" => Ok(Format::PyFile),
            "json" => Ok(Format::Json),
            "toml" => Ok(Format::Toml),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(format!("Invalid config format '{other}'")),
        }
    }
}

/// Where the loader reads content from.
pub enum LoadSource<'a> {
    /// A stream positioned at the start of the content.
    Reader(&'a mut dyn Read),
    /// A local file, usually the cache file.
    Path(&'a Path),
}

/// Parses a config source and merges it into a store.
pub trait ConfigLoader {
    /// Returns `Ok(true)` when the store was updated. With `silent` set, read
    /// and parse failures yield `Ok(false)` instead of an error.
    fn load(
        &self,
        store: &mut dyn ConfigStore,
        format: Format,
        strategy: MergeStrategy,
        source: LoadSource<'_>,
        silent: bool,
    ) -> Result<bool, LoadError>;
}

/// Default loader handling every [`Format`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatLoader;

impl ConfigLoader for FormatLoader {
    fn load(
        &self,
        store: &mut dyn ConfigStore,
        format: Format,
        strategy: MergeStrategy,
        source: LoadSource<'_>,
        silent: bool,
    ) -> Result<bool, LoadError> {
        // Parse everything before touching the store so a failure leaves it unchanged.
        let entries = match read_source(source).and_then(|content| parse(format, &content)) {
            Ok(entries) => entries,
            Err(e) if silent => {
                tracing::warn!(format = format.as_str(), "Skipping config source: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let written = store.merge(entries, strategy);
        tracing::debug!(
            format = format.as_str(),
            strategy = strategy.as_str(),
            keys = written,
            "Merged config entries"
        );
        Ok(true)
    }
}

fn read_source(source: LoadSource<'_>) -> Result<String, LoadError> {
    let bytes = match source {
        LoadSource::Reader(reader) => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map_err(LoadError::Stream)?;
            buf
        }
        LoadSource::Path(path) => fs::read(path)
            .map_err(|source| LoadError::Read { path: path.to_path_buf(), source })?,
    };
    String::from_utf8(bytes).map_err(|_| LoadError::Encoding)
}

/// Parse `content` into ordered top-level entries.
pub fn parse(format: Format, content: &str) -> Result<Vec<(String, Value)>, LoadError> {
    let value = match format {
        Format::PyFile => return pyfile::parse_assignments(content),
        Format::Json => serde_json::from_str::<Value>(content)
            .map_err(|e| LoadError::Parse { format: "json", message: e.to_string() })?,
        Format::Toml => toml::from_str::<Value>(content)
            .map_err(|e| LoadError::Parse { format: "toml", message: e.to_string() })?,
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_yaml::from_str::<Value>(content)
                .map_err(|e| LoadError::Parse { format: "yaml", message: e.to_string() })?
        }
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(LoadError::NotAMapping { format: format.as_str() }),
    }
}
