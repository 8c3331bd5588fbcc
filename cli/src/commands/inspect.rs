//! `imagesmith inspect` command.

use std::path::PathBuf;

use clap::Args;
use imagesmith_runtime::ImageDescriptor;

use super::Context;

#[derive(Args)]
pub struct InspectArgs {
    /// Path to a Dockerfile under a resources/ tree
    pub dockerfile: PathBuf,

    /// Also report whether the image is available locally
    #[arg(long)]
    pub cached: bool,
}

pub async fn execute(args: InspectArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = ImageDescriptor::derive(&args.dockerfile, &ctx.substitution)?;

    let mut output = serde_json::to_value(&descriptor)?;
    if args.cached {
        let cached = ctx.cache_oracle(None).is_cached(&descriptor).await;
        output["cached"] = serde_json::Value::Bool(cached);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
