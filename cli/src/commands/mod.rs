//! CLI command definitions and dispatch.

mod inspect;
mod list;
mod substitute;
mod version;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use imagesmith_core::{ImagesmithConfig, ProbeKind};
use imagesmith_runtime::{CacheOracle, Substitution};

/// Derive fixture image names from Dockerfile layouts.
#[derive(Parser)]
#[command(name = "imagesmith", version, about)]
pub struct Cli {
    /// YAML config file (environment overrides still apply)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// List the images derived from every Dockerfile under a directory
    List(list::ListArgs),
    /// Show the descriptor derived from a single Dockerfile as JSON
    Inspect(inspect::InspectArgs),
    /// Print the substituted form of an image reference
    Substitute(substitute::SubstituteArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Resolved process state shared by every command.
pub struct Context {
    pub config: ImagesmithConfig,
    pub substitution: Substitution,
}

impl Context {
    /// Oracle for the configured probe, or for `kind` when given.
    pub fn cache_oracle(&self, kind: Option<ProbeKind>) -> CacheOracle {
        let mut probe = self.config.probe.clone();
        if let Some(kind) = kind {
            probe.kind = kind;
        }
        if probe.index_dir.is_none() {
            probe.index_dir = Some(index_dir());
        }
        CacheOracle::from_config(&probe)
    }
}

/// Default image index directory (~/.imagesmith/images).
pub(crate) fn index_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".imagesmith"))
        .unwrap_or_else(|| PathBuf::from(".imagesmith"))
        .join("images")
}

/// Load the config file when given, otherwise defaults plus environment
/// overrides.
pub fn load_config(config_path: Option<&Path>) -> imagesmith_core::Result<ImagesmithConfig> {
    match config_path {
        Some(path) => ImagesmithConfig::load(path),
        None => {
            let config = ImagesmithConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Install the process-wide substitution rule for a loaded configuration.
fn resolve_context(
    config: imagesmith_core::Result<ImagesmithConfig>,
) -> Result<Context, Box<dyn std::error::Error>> {
    let config = config?;
    let substitution =
        imagesmith_runtime::oci::install(Substitution::from_config(&config.substitution))?;
    tracing::debug!(rule = %substitution.description(), "Resolved configuration");

    Ok(Context {
        config,
        substitution,
    })
}

/// Dispatch a parsed CLI to the appropriate command handler.
///
/// `config` is the result of [`load_config`]; commands that need it report
/// a load failure, `version` does not.
pub async fn dispatch(
    cli: Cli,
    config: imagesmith_core::Result<ImagesmithConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::List(args) => list::execute(args, &resolve_context(config)?).await,
        Command::Inspect(args) => inspect::execute(args, &resolve_context(config)?).await,
        Command::Substitute(args) => substitute::execute(args, &resolve_context(config)?).await,
        Command::Version(args) => version::execute(args).await,
    }
}
