//! Load command implementation

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use config_source_s3::cache::default_cache_path;
use config_source_s3::settings::{apply_env_overrides, load_settings};
use config_source_s3::{
    load_from_source, Format, FormatLoader, MergeStrategy, S3Provider, SourceLocation,
    SourceRequest,
};

#[derive(Args)]
pub struct LoadArgs {
    /// Object URI (s3://bucket/key)
    #[arg(value_name = "URI", required_unless_present = "bucket", conflicts_with = "bucket")]
    pub uri: Option<String>,

    /// Bucket name, used with --key instead of a URI
    #[arg(short, long, value_name = "BUCKET", requires = "key")]
    pub bucket: Option<String>,

    /// Object key inside --bucket
    #[arg(short, long, value_name = "KEY", requires = "bucket")]
    pub key: Option<String>,

    /// Access key ID (defaults to settings, then AWS_ACCESS_KEY_ID)
    #[arg(long, value_name = "KEY")]
    pub access_key: Option<String>,

    /// Secret access key (defaults to settings, then AWS_SECRET_ACCESS_KEY)
    #[arg(long, value_name = "SECRET")]
    pub secret_key: Option<String>,

    /// Bucket region
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Keep a local copy of the object in this file and reuse it
    #[arg(short = 'c', long, value_name = "FILE", conflicts_with = "cache_default")]
    pub cache: Option<PathBuf>,

    /// Keep a local copy under the default cache directory
    #[arg(long)]
    pub cache_default: bool,

    /// Download again even if the cache file exists
    #[arg(long)]
    pub update_cache: bool,

    /// Print an empty config instead of failing when the download fails
    #[arg(long)]
    pub silent: bool,

    /// Config format: pyfile, json, toml, yaml (inferred from the key by default)
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Do not let later sources overwrite keys that are already set
    #[arg(long)]
    pub keep_existing: bool,

    /// Path to settings file (config-source.toml or .config-source.yml)
    #[arg(short = 's', long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

pub fn run(args: LoadArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed reading current directory")?;
    let mut settings = load_settings(&cwd, args.settings.as_deref())?;
    apply_env_overrides(&mut settings);
    if let Some(endpoint) = args.endpoint {
        settings.s3.endpoint = Some(endpoint);
    }

    let location = match (args.uri, args.bucket, args.key) {
        (Some(uri), _, _) => SourceLocation::Uri(uri),
        (None, Some(bucket), Some(filename)) => SourceLocation::Bucket { bucket, filename },
        _ => anyhow::bail!("Either URI or --bucket with --key must be specified"),
    };
    let resolved = location.resolve()?;

    let format = match args.format {
        Some(name) => name.parse::<Format>().map_err(anyhow::Error::msg)?,
        None => Format::from_extension(&resolved.key).unwrap_or_default(),
    };
    let strategy = if args.keep_existing { MergeStrategy::KeepExisting } else { MergeStrategy::Dict };

    let mut request = SourceRequest::new(location)
        .format(format)
        .merge_strategy(strategy)
        .update_cache(args.update_cache || settings.cache.update)
        .silent(args.silent);
    if let Some(access_key) = args.access_key {
        request = request.access_key(access_key);
    }
    if let Some(secret_key) = args.secret_key {
        request = request.secret_key(secret_key);
    }
    if let Some(region) = args.region {
        request = request.region(region);
    }

    let cache_path = match args.cache {
        Some(path) => Some(path),
        None if args.cache_default => Some(
            default_cache_path(&resolved, settings.cache.dir.as_deref())
                .context("Could not determine a cache directory; pass --cache FILE")?,
        ),
        None => None,
    };
    if let Some(path) = cache_path {
        tracing::debug!("Caching {} at {}", resolved, path.display());
        request = request.cache_path(path);
    }

    let provider = S3Provider::new(settings.s3);
    let mut config = Map::new();
    let loaded = load_from_source(&mut config, &request, &provider, &FormatLoader)?;
    if !loaded {
        eprintln!("Note: could not load {resolved}; printing an empty config");
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(config))?);
    Ok(())
}
