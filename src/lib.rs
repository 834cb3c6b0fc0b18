//! config-source-s3: load application configuration from S3-compatible buckets
//!
//! A config object is named by an `s3://bucket/key` URI (or a bucket plus
//! filename), downloaded into memory or into a local cache file, parsed, and
//! merged into a caller-owned [`ConfigStore`].
//!
//! ```no_run
//! use config_source_s3::{load_from_s3, SourceRequest};
//! use serde_json::Value;
//! use std::collections::BTreeMap;
//!
//! let mut config: BTreeMap<String, Value> = BTreeMap::new();
//! let request = SourceRequest::uri("s3://my-bucket/app/settings.py")
//!     .cache_path("/var/cache/app/settings.py");
//! load_from_s3(&mut config, &request)?;
//! # Ok::<(), config_source_s3::SourceError>(())
//! ```

pub mod bucket;
pub mod cache;
pub mod error;
pub mod loader;
pub mod location;
pub mod settings;
pub mod source;
pub mod store;

pub use bucket::{BucketHandle, BucketProvider, Credentials, S3Provider};
pub use error::{LoadError, SettingsError, SourceError, TransferError};
pub use loader::{ConfigLoader, Format, FormatLoader, LoadSource};
pub use location::{Location, SourceLocation};
pub use source::{
    load_from_s3, load_from_source, plan_fetch, CacheSpec, FetchPlan, SourceRequest,
};
pub use store::{ConfigStore, MergeStrategy};
