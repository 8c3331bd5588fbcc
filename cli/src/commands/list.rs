//! `imagesmith list` command.

use std::path::PathBuf;

use clap::Args;
use imagesmith_core::ProbeKind;
use imagesmith_runtime::{Catalog, ImageDescriptor};
use serde::Serialize;

use super::Context;
use crate::output;

#[derive(Args)]
pub struct ListArgs {
    /// Directory to search for Dockerfiles
    pub root: PathBuf,

    /// Check whether each image is already available locally
    #[arg(long)]
    pub cached: bool,

    /// Presence probe to use with --cached (docker, index, none)
    #[arg(long)]
    pub probe: Option<ProbeKind>,

    /// Only show image names (one per line)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print descriptors as JSON
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,

    /// Fail if any Dockerfile cannot be derived
    #[arg(long)]
    pub strict: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    descriptor: &'a ImageDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached: Option<bool>,
}

pub async fn execute(args: ListArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::scan(&args.root, &ctx.substitution).await?;

    for (path, error) in catalog.failures() {
        eprintln!("Skipping {}: {}", path.display(), error);
    }
    if args.strict && !catalog.failures().is_empty() {
        return Err(format!(
            "{} Dockerfile(s) under {} could not be derived",
            catalog.failures().len(),
            args.root.display()
        )
        .into());
    }

    let oracle = args.cached.then(|| ctx.cache_oracle(args.probe));

    let mut rows = Vec::with_capacity(catalog.descriptors().len());
    for descriptor in catalog.descriptors() {
        let cached = match &oracle {
            Some(oracle) => Some(oracle.is_cached(descriptor).await),
            None => None,
        };
        rows.push(Row { descriptor, cached });
    }

    if args.quiet {
        for row in &rows {
            println!("{}", row.descriptor.image_name());
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut headers = vec!["IMAGE", "BASE IMAGE", "PULL FROM"];
    if args.cached {
        headers.push("CACHED");
    }
    let mut table = output::new_table(&headers);
    for row in &rows {
        let mut cells = vec![
            row.descriptor.image_name().to_string(),
            row.descriptor.base_image_name().to_string(),
            row.descriptor.base_image_name_substituted().to_string(),
        ];
        if let Some(cached) = row.cached {
            cells.push(output::format_cached(cached).to_string());
        }
        table.add_row(cells);
    }

    println!("{table}");
    Ok(())
}
