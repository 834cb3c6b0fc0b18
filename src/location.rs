//! Bucket/key resolution for `s3://` locations

use crate::error::SourceError;
use std::fmt;

pub const S3_SCHEME: &str = "s3://";

/// A resolved object location inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub bucket: String,
    pub key: String,
}

impl Location {
    /// Split an `s3://bucket[/key]` URI into bucket and key.
    ///
    /// The key keeps everything after the first `/` following the bucket, with
    /// surrounding slashes stripped. An empty key is accepted here:
    ///
    /// - `s3://my-bucket`          → `("my-bucket", "")`
    /// - `s3://my-bucket/dir/`     → `("my-bucket", "dir")`
    /// - `s3://my-bucket/dir/file` → `("my-bucket", "dir/file")`
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        let rest = uri
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| SourceError::InvalidLocation(uri.to_string()))?;

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(SourceError::InvalidLocation(uri.to_string()));
        }

        Ok(Self { bucket: bucket.to_string(), key: normalize_key(key) })
    }

    /// Build a location from an explicit bucket name and object filename.
    pub fn from_parts(bucket: &str, filename: &str) -> Result<Self, SourceError> {
        let bucket = bucket.trim();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(SourceError::InvalidLocation(bucket.to_string()));
        }
        Ok(Self { bucket: bucket.to_string(), key: normalize_key(filename) })
    }

    /// Last segment of the key, used to name cache files.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{S3_SCHEME}{}", self.bucket)
        } else {
            write!(f, "{S3_SCHEME}{}/{}", self.bucket, self.key)
        }
    }
}

/// Where a config object lives, in either of the two accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A combined `s3://bucket/key` URI.
    Uri(String),
    /// A bucket name plus an object key inside it.
    Bucket { bucket: String, filename: String },
}

impl SourceLocation {
    /// Resolve into a [`Location`] that names an actual object.
    pub fn resolve(&self) -> Result<Location, SourceError> {
        let location = match self {
            SourceLocation::Uri(uri) => Location::parse(uri)?,
            SourceLocation::Bucket { bucket, filename } => Location::from_parts(bucket, filename)?,
        };
        if location.key.is_empty() {
            return Err(SourceError::EmptyFilename);
        }
        Ok(location)
    }
}

impl From<&str> for SourceLocation {
    fn from(uri: &str) -> Self {
        SourceLocation::Uri(uri.to_string())
    }
}

impl From<String> for SourceLocation {
    fn from(uri: String) -> Self {
        SourceLocation::Uri(uri)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim_matches('/').to_string()
}
