//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// toolchest - tool package acquisition and asset manifests
#[derive(Parser)]
#[command(name = "toolchest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tool package acquisition and asset-manifest pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install a tool package and build its asset manifest
    #[command(alias = "i")]
    Install {
        /// Package id (lowercase name, e.g. demo.tool)
        package: String,

        /// Version range (e.g. ">=1.2.0", "~=1.2.0", "1.2.0"; default any)
        #[arg(long, default_value = "*")]
        version: String,

        /// Install into the shared store instead of the location root
        #[arg(long)]
        global: bool,

        /// Package source base URL (repeatable, ordered by priority)
        #[arg(long = "source", value_name = "URL")]
        sources: Vec<String>,

        /// Root directory for local installs
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,

        /// Shared store root for global installs
        #[arg(long, value_name = "DIR", env = "TOOLCHEST_STORE")]
        store: Option<PathBuf>,

        /// Target framework moniker
        #[arg(long, default_value = "net8.0")]
        framework: String,

        /// Target runtime identifier
        #[arg(long, default_value = "any")]
        runtime: String,

        /// Runtime compatibility graph file (JSON); defaults to the
        /// embedded graph
        #[arg(long, value_name = "PATH")]
        runtime_graph: Option<PathBuf>,
    },

    /// Create a .tpkg archive from a directory containing package.toml
    Pack {
        /// Directory to archive
        dir: PathBuf,

        /// Output archive path
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },
}
