//! Bucket access (S3 and S3-compatible object stores)
//!
//! The fetch logic only depends on the two traits here. [`S3Provider`] is the
//! production implementation; tests substitute their own providers.

pub mod s3;

use crate::error::TransferError;
use std::io::Write;
use std::path::Path;

pub use s3::{ObjectStoreBucket, S3Provider};

/// Per-call credentials. Absent values fall back to the provider's settings
/// and then to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
}

/// Hands out a handle for a named bucket.
pub trait BucketProvider {
    fn bucket(
        &self,
        name: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn BucketHandle>, TransferError>;
}

/// Download operations on a single bucket. Both return the number of bytes moved.
pub trait BucketHandle {
    /// Stream the object into `writer`.
    fn download_to_writer(&self, key: &str, writer: &mut dyn Write) -> Result<u64, TransferError>;

    /// Download the object to `path`, replacing any existing file.
    fn download_to_file(&self, key: &str, path: &Path) -> Result<u64, TransferError>;
}
