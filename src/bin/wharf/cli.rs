//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wharf - a packager for prebuilt C libraries
#[derive(Parser)]
#[command(name = "wharf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble the library into a package and publish it to the repository
    Package(PackageArgs),

    /// Synchronize workspace references with the dependency list
    Sync(SyncArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PackageArgs {
    /// Build configuration name
    #[arg(default_value = "Release")]
    pub configuration: String,

    /// Package name (defaults to the project directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Version tag appended to the package identity
    #[arg(long)]
    pub version_tag: Option<String>,

    /// Target architecture (repeatable)
    #[arg(long = "arch")]
    pub arch: Vec<String>,

    /// Copy qualifying source units into the package
    #[arg(long)]
    pub embed_source: bool,

    /// Ship sources only; skip building and fusing the binary
    #[arg(long)]
    pub source_only: bool,

    /// Minimum platform version recorded in the framework metadata
    #[arg(long)]
    pub platform_floor: Option<String>,

    /// Repository root override
    #[arg(long, env = "WHARF_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Public-header list file (defaults to Headers.list at the project root)
    #[arg(long)]
    pub header_list: Option<PathBuf>,

    /// Forced-linkage list file (defaults to ForceLink.list at the project root)
    #[arg(long)]
    pub forcelink_list: Option<PathBuf>,

    /// Resource naming policy: warn or reject
    #[arg(long)]
    pub resource_policy: Option<String>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Repository root override
    #[arg(long, env = "WHARF_REPOSITORY")]
    pub repository: Option<PathBuf>,

    /// Dependency list file (defaults to Deps.list in the workspace)
    #[arg(long)]
    pub deps_list: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
