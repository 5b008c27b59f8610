//! Install orchestration
//!
//! One `install` call acquires one package end to end: download and
//! extraction, manifest construction, and, for global installs, the
//! relocation of the staged tree into the permanent store. The
//! relocation races with external filesystem actors (antivirus,
//! indexers), so it retries with backoff; everything else fails fast.

use crate::acquire;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use toolchest_assets::RuntimeGraph;
use toolchest_errors::{Error, PackageError, StorageError};
use toolchest_manifest::build_tool_manifest;
use toolchest_net::PackageFetcher;
use toolchest_store::ToolPackageStore;
use toolchest_types::{
    InstalledToolPackage, PackageId, PackageLocation, TargetEnvironment, VersionSpec,
    METADATA_ENTRY,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Install destination scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallScope {
    /// Shared store; staged extraction relocated into the permanent
    /// per-version directory
    Global,
    /// Project-scoped; extraction and assets stay under the location's
    /// root directory
    Local,
}

/// Retry policy for relocating staged content
#[derive(Debug, Clone)]
pub struct MoveRetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Backoff multiplier per attempt
    pub backoff_multiplier: f64,
}

impl Default for MoveRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }
}

impl MoveRetryConfig {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let base = self.initial_delay.as_millis() as f64;
        #[allow(clippy::cast_possible_wrap)]
        let delay = base * self.backoff_multiplier.powi(attempt as i32 - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Duration::from_millis(delay.round() as u64)
    }
}

/// Orchestrates acquisition and manifest construction for one package
pub struct ToolInstaller {
    fetcher: Arc<dyn PackageFetcher>,
    store: ToolPackageStore,
    graph: RuntimeGraph,
    target: TargetEnvironment,
    move_retry: MoveRetryConfig,
}

impl ToolInstaller {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PackageFetcher>,
        store: ToolPackageStore,
        graph: RuntimeGraph,
        target: TargetEnvironment,
    ) -> Self {
        Self {
            fetcher,
            store,
            graph,
            target,
            move_retry: MoveRetryConfig::default(),
        }
    }

    /// Override the relocation retry policy
    #[must_use]
    pub fn with_move_retry(mut self, move_retry: MoveRetryConfig) -> Self {
        self.move_retry = move_retry;
        self
    }

    /// Install one package
    ///
    /// # Errors
    ///
    /// Fetcher, metadata, and store errors propagate unchanged. A global
    /// install of an already-installed version fails with
    /// `PackageError::Conflict`; a relocation that stays contended past
    /// the retry budget fails with `StorageError::MoveContention`.
    pub async fn install(
        &self,
        location: &PackageLocation,
        id: &PackageId,
        spec: &VersionSpec,
        scope: InstallScope,
    ) -> Result<InstalledToolPackage, Error> {
        match scope {
            InstallScope::Global => self.install_global(location, id, spec).await,
            InstallScope::Local => self.install_local(location, id, spec).await,
        }
    }

    async fn install_global(
        &self,
        location: &PackageLocation,
        id: &PackageId,
        spec: &VersionSpec,
    ) -> Result<InstalledToolPackage, Error> {
        let staging_root = self.store.staging_dir().await?;
        let staging_store = ToolPackageStore::new(staging_root.clone());

        let (version, staged_dir) =
            acquire(self.fetcher.as_ref(), location, id, spec, &staging_root).await?;

        // Manifest is built against the staged content and travels with
        // it into the store.
        build_tool_manifest(
            &staging_store,
            &self.graph,
            id,
            &version,
            &self.target,
            &staged_dir,
        )
        .await?;

        let final_dir = self.store.package_dir(id, &version);
        if fs::metadata(final_dir.join(METADATA_ENTRY)).await.is_ok() {
            return Err(PackageError::Conflict {
                package: id.to_string(),
                version: version.to_string(),
            }
            .into());
        }

        fs::create_dir_all(self.store.root_package_dir(id))
            .await
            .map_err(|e| Error::io_with_path(&e, self.store.root_package_dir(id)))?;

        self.relocate(&staged_dir, &final_dir).await?;

        // Leftover staging scaffolding; nothing of value remains here.
        let _ = fs::remove_dir_all(&staging_root).await;

        info!(package = %id, %version, dir = %final_dir.display(), "global install complete");
        Ok(InstalledToolPackage {
            id: id.clone(),
            version,
            content_dir: final_dir.clone(),
            manifest_dir: final_dir,
        })
    }

    async fn install_local(
        &self,
        location: &PackageLocation,
        id: &PackageId,
        spec: &VersionSpec,
    ) -> Result<InstalledToolPackage, Error> {
        let dest_root = location.root_dir.clone();
        let local_store = ToolPackageStore::new(dest_root.clone());

        let (version, package_dir) =
            acquire(self.fetcher.as_ref(), location, id, spec, &dest_root).await?;

        // Per-instance asset directory; local installs are scoped for
        // the caller's immediate use and never relocated.
        let asset_dir = dest_root.join("assets").join(Uuid::new_v4().to_string());
        fs::create_dir_all(&asset_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &asset_dir))?;

        build_tool_manifest(
            &local_store,
            &self.graph,
            id,
            &version,
            &self.target,
            &asset_dir,
        )
        .await?;

        info!(package = %id, %version, dir = %package_dir.display(), "local install complete");
        Ok(InstalledToolPackage {
            id: id.clone(),
            version,
            content_dir: package_dir,
            manifest_dir: asset_dir,
        })
    }

    /// Move staged content into its final location, retrying on
    /// transient contention
    async fn relocate(&self, from: &Path, to: &Path) -> Result<(), Error> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match fs::rename(from, to).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.move_retry.max_attempts => {
                    let delay = self.move_retry.delay_for_attempt(attempt);
                    warn!(
                        from = %from.display(),
                        to = %to.display(),
                        attempt,
                        error = %e,
                        "relocation contended, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(StorageError::MoveContention {
                        path: to.display().to_string(),
                        attempts: attempt,
                        message: e.to_string(),
                    }
                    .into());
                }
            }
        }
    }
}
