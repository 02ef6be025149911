use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lazyroute",
    about = "Deferred chunk loading and route resolution",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a route table and list its routes
    Check(CheckArgs),
    /// Resolve paths against a route table without loading anything
    Match(MatchArgs),
    /// Run navigations in order against a chunk directory
    Navigate(NavigateArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Route configuration file
    #[arg(long, default_value = "routes.toml")]
    pub routes: PathBuf,
}

#[derive(Args)]
pub struct MatchArgs {
    #[arg(long, default_value = "routes.toml")]
    pub routes: PathBuf,
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Args)]
pub struct NavigateArgs {
    #[arg(long, default_value = "routes.toml")]
    pub routes: PathBuf,
    /// Transport and navigator settings (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory of chunk manifests (`<chunk-id>.toml`) [default: chunks]
    #[arg(long)]
    pub chunks: Option<PathBuf>,
    /// Per-chunk load deadline in milliseconds [default: 10000]
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Load attempts per navigation [default: 1]
    #[arg(long)]
    pub attempts: Option<u32>,
    /// Prefetch every deferred chunk before navigating
    #[arg(long)]
    pub preload: bool,
    #[arg(required = true)]
    pub paths: Vec<String>,
}
