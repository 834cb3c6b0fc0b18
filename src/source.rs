//! Loading configuration from a bucket, with an optional local cache file
//!
//! Every call walks the same steps:
//!
//! 1. resolve the location (always fails loudly on bad input),
//! 2. pick a [`FetchPlan`] from the cache settings,
//! 3. fetch into memory, fetch into the cache file, or reuse the cache file,
//! 4. hand the content to a [`ConfigLoader`].

use crate::bucket::{BucketProvider, Credentials, S3Provider};
use crate::error::{SourceError, TransferError};
use crate::loader::{ConfigLoader, Format, FormatLoader, LoadSource};
use crate::location::{Location, SourceLocation};
use crate::store::{ConfigStore, MergeStrategy};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Local cache file settings for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSpec {
    pub path: PathBuf,
    /// Download even when the cache file already exists.
    pub update: bool,
}

/// Where the content for a call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan<'a> {
    /// No cache configured: download into an in-memory buffer.
    RemoteToMemory,
    /// Download into the cache file, replacing it if present.
    RemoteToFile(&'a Path),
    /// The cache file exists and no refresh was requested.
    UseCached(&'a Path),
}

/// Decide how to obtain the content for a call.
pub fn plan_fetch(cache: Option<&CacheSpec>) -> FetchPlan<'_> {
    match cache {
        None => FetchPlan::RemoteToMemory,
        Some(spec) if !spec.update && spec.path.is_file() => FetchPlan::UseCached(&spec.path),
        Some(spec) => FetchPlan::RemoteToFile(&spec.path),
    }
}

/// Parameters of a single load.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    location: SourceLocation,
    credentials: Credentials,
    cache_path: Option<PathBuf>,
    update_cache: bool,
    format: Format,
    strategy: MergeStrategy,
    silent: bool,
}

impl SourceRequest {
    pub fn new(location: impl Into<SourceLocation>) -> Self {
        Self {
            location: location.into(),
            credentials: Credentials::default(),
            cache_path: None,
            update_cache: false,
            format: Format::default(),
            strategy: MergeStrategy::default(),
            silent: false,
        }
    }

    /// Request for a combined `s3://bucket/key` URI.
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::new(SourceLocation::Uri(uri.into()))
    }

    /// Request for `filename` inside `bucket`.
    pub fn bucket(bucket: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(SourceLocation::Bucket { bucket: bucket.into(), filename: filename.into() })
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.credentials.access_key = Some(access_key.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.credentials.secret_key = Some(secret_key.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.credentials.region = Some(region.into());
        self
    }

    /// Keep a local copy of the object at `path` and reuse it on later calls.
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Refresh the cache file even if it exists. Ignored without a cache path.
    pub fn update_cache(mut self, update: bool) -> Self {
        self.update_cache = update;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Report transfer failures as `Ok(false)` instead of an error.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn cache_spec(&self) -> Option<CacheSpec> {
        self.cache_path
            .as_ref()
            .map(|path| CacheSpec { path: path.clone(), update: self.update_cache })
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

enum Fetched<'a> {
    Memory(Cursor<Vec<u8>>),
    File(&'a Path),
}

/// Load the object named by `request` into `store`.
///
/// Returns `Ok(true)` when the loader updated the store and `Ok(false)` when
/// `silent` swallowed a transfer or load failure. Location errors
/// ([`SourceError::InvalidLocation`], [`SourceError::EmptyFilename`]) are
/// returned even in silent mode. The store is untouched unless loading succeeds.
pub fn load_from_source(
    store: &mut dyn ConfigStore,
    request: &SourceRequest,
    provider: &dyn BucketProvider,
    loader: &dyn ConfigLoader,
) -> Result<bool, SourceError> {
    let location = request.location.resolve()?;
    let cache = request.cache_spec();
    let plan = plan_fetch(cache.as_ref());
    tracing::debug!(location = %location, plan = ?plan, "Loading config");

    let fetched = match fetch(plan, &location, &request.credentials, provider) {
        Ok(fetched) => fetched,
        Err(e) => {
            let err = SourceError::from(e);
            if request.silent && err.is_suppressible() {
                tracing::warn!(location = %location, "Failed to fetch config: {}", err);
                return Ok(false);
            }
            return Err(err);
        }
    };

    let loaded = match fetched {
        Fetched::Memory(mut buffer) => loader.load(
            store,
            request.format,
            request.strategy,
            LoadSource::Reader(&mut buffer),
            request.silent,
        )?,
        Fetched::File(path) => loader.load(
            store,
            request.format,
            request.strategy,
            LoadSource::Path(path),
            request.silent,
        )?,
    };
    Ok(loaded)
}

/// [`load_from_source`] against S3 configured from the environment, with the
/// default loader.
pub fn load_from_s3(
    store: &mut dyn ConfigStore,
    request: &SourceRequest,
) -> Result<bool, SourceError> {
    load_from_source(store, request, &S3Provider::from_env(), &FormatLoader)
}

fn fetch<'a>(
    plan: FetchPlan<'a>,
    location: &Location,
    credentials: &Credentials,
    provider: &dyn BucketProvider,
) -> Result<Fetched<'a>, TransferError> {
    match plan {
        FetchPlan::UseCached(path) => {
            tracing::debug!(path = %path.display(), "Using cached config file");
            Ok(Fetched::File(path))
        }
        FetchPlan::RemoteToFile(path) => {
            let bucket = provider.bucket(&location.bucket, credentials)?;
            bucket.download_to_file(&location.key, path)?;
            Ok(Fetched::File(path))
        }
        FetchPlan::RemoteToMemory => {
            let bucket = provider.bucket(&location.bucket, credentials)?;
            let mut buffer = Cursor::new(Vec::new());
            bucket.download_to_writer(&location.key, &mut buffer)?;
            buffer.flush()?;
            buffer.seek(SeekFrom::Start(0))?;
            Ok(Fetched::Memory(buffer))
        }
    }
}
