//! `imagesmith substitute` command.

use clap::Args;
use imagesmith_runtime::ImageReference;

use super::Context;

#[derive(Args)]
pub struct SubstituteArgs {
    /// Bare image reference, e.g. postgres:17-alpine
    pub image: String,
}

pub async fn execute(args: SubstituteArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let original = ImageReference::parse(&args.image)?;
    let substituted = ctx.substitution.apply(&original)?;
    println!("{substituted}");
    Ok(())
}
