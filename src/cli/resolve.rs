//! Resolve command implementation

use anyhow::Result;
use clap::Args;
use config_source_s3::Location;
use serde_json::json;

#[derive(Args)]
pub struct ResolveArgs {
    /// Object URI (s3://bucket/key)
    #[arg(value_name = "URI")]
    pub uri: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let location = Location::parse(&args.uri)?;

    if args.json {
        println!("{}", json!({ "bucket": location.bucket, "key": location.key }));
    } else {
        println!("bucket: {}", location.bucket);
        println!("key: {}", location.key);
    }

    Ok(())
}
