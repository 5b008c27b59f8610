//! toolchest - tool package acquisition and asset manifests
//!
//! Thin CLI over the library crates: resolves arguments into the
//! installer's inputs, runs one operation, and maps errors to the exit
//! code.

mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use std::process;
use std::sync::Arc;
use toolchest_assets::RuntimeGraph;
use toolchest_errors::Error;
use toolchest_install::{InstallScope, ToolInstaller};
use toolchest_net::HttpPackageFetcher;
use toolchest_store::ToolPackageStore;
use toolchest_types::{PackageId, PackageLocation, TargetEnvironment, VersionSpec};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("operation failed: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("toolchest={default}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), Error> {
    match cli.command {
        Commands::Install {
            package,
            version,
            global,
            sources,
            root,
            store,
            framework,
            runtime,
            runtime_graph,
        } => {
            let id: PackageId = package.parse()?;
            let spec: VersionSpec = version.parse()?;
            let graph = match runtime_graph {
                Some(path) => RuntimeGraph::from_file(&path).await?,
                None => RuntimeGraph::builtin(),
            };

            let store_root = store.unwrap_or_else(|| root.join(".toolchest"));
            let installer = ToolInstaller::new(
                Arc::new(HttpPackageFetcher::with_defaults()?),
                ToolPackageStore::new(store_root),
                graph,
                TargetEnvironment::new(framework, runtime),
            );

            let location = PackageLocation::new(sources, root);
            let scope = if global {
                InstallScope::Global
            } else {
                InstallScope::Local
            };

            let installed = installer.install(&location, &id, &spec, scope).await?;
            println!(
                "Installed {} {} -> {}",
                installed.id,
                installed.version,
                installed.content_dir.display()
            );
            println!("Manifest: {}", installed.manifest_dir.display());
            Ok(())
        }
        Commands::Pack { dir, output } => {
            toolchest_store::create_package(&dir, &output).await?;
            println!("Created {}", output.display());
            Ok(())
        }
    }
}
