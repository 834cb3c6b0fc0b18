//! config-source: fetch configuration from S3-compatible buckets
//!
//! Resolves `s3://` locations and loads config objects (optionally through a
//! local cache file), printing the merged result as JSON.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
