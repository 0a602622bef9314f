use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Discover, rank and cache the best favicon for any web site.
#[derive(Debug, Parser)]
#[command(name = "favr", version, about)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON). Defaults to the platform config directory.
    #[arg(short, long, env = "FAVR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the best icon for a site, serving it from the cache when possible.
    Get {
        #[command(flatten)]
        target: Target,
        /// Write the image here instead of to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every icon candidate found for a site as JSON. Bypasses the cache.
    Discover {
        #[command(flatten)]
        target: Target,
    },
}

/// Which icon to look for. Validated the same way as the `url`, `size` and
/// `dpr` query parameters of an icon request.
#[derive(Debug, Args)]
pub struct Target {
    /// Site URL; `https://` is assumed when no scheme is given.
    pub url: String,
    /// One of `favicon`, `32` or `64`.
    #[arg(short, long)]
    pub size: Option<String>,
    /// Device pixel ratio; rounded and clamped to 1..=3.
    #[arg(short, long)]
    pub dpr: Option<String>,
}
