//! Package acquisition: download, verify, extract
//!
//! Downloads one package via the external fetcher, reads its declared
//! metadata to learn the concrete version, persists the integrity hash,
//! and expands the archive into the version-qualified directory of the
//! destination root. The hash covers the raw metadata blob and is
//! written before extraction begins.

use std::path::{Path, PathBuf};
use tokio::fs;
use toolchest_errors::{Error, PackageError};
use toolchest_hash::Hash;
use toolchest_net::PackageFetcher;
use toolchest_store::ToolPackageStore;
use toolchest_types::{PackageId, PackageLocation, PackageMetadata, Version, VersionSpec};
use tracing::{debug, info};

/// Acquire a package into `dest_root`
///
/// Returns the resolved version and the extraction directory
/// `<dest_root>/<id>/<version>/`.
///
/// # Errors
///
/// - Fetcher errors propagate unchanged.
/// - `PackageError::InvalidMetadata` if the artifact's declared metadata
///   is unreadable or does not match the requested id.
/// - `PackageError::Conflict` if the artifact's canonical path is
///   occupied by a directory, which indicates store corruption.
pub async fn acquire(
    fetcher: &dyn PackageFetcher,
    location: &PackageLocation,
    id: &PackageId,
    spec: &VersionSpec,
    dest_root: &Path,
) -> Result<(Version, PathBuf), Error> {
    let store = ToolPackageStore::new(dest_root.to_path_buf());
    let download_dir = store.root_package_dir(id);

    let artifact = fetcher.download(id, spec, location, &download_dir).await?;
    debug!(package = %id, artifact = %artifact.display(), "artifact downloaded");

    // Concrete version comes from the artifact's own declaration, not
    // from the resolution step.
    let blob = toolchest_store::read_metadata(&artifact).await?;
    let metadata = parse_metadata(id, &blob)?;
    let version = metadata.version.clone();

    // Hash file goes in before any content does.
    let hash_path = store.hash_path(id, &version);
    if let Some(parent) = hash_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }
    let hash = Hash::from_data(&blob);
    fs::write(&hash_path, hash.to_base64())
        .await
        .map_err(|e| Error::io_with_path(&e, &hash_path))?;

    let package_dir = store.package_dir(id, &version);
    fetcher.extract(&artifact, &package_dir).await?;

    // Degenerate collision between the artifact location and an
    // extraction target; the store is corrupt if this ever fires.
    let canonical_artifact = store.artifact_path(id, &version);
    if fs::metadata(&canonical_artifact)
        .await
        .is_ok_and(|m| m.is_dir())
    {
        return Err(PackageError::Conflict {
            package: id.to_string(),
            version: version.to_string(),
        }
        .into());
    }

    if artifact != canonical_artifact {
        fs::rename(&artifact, &canonical_artifact)
            .await
            .map_err(|e| Error::io_with_path(&e, &canonical_artifact))?;
    }

    info!(package = %id, %version, dir = %package_dir.display(), "package acquired");
    Ok((version, package_dir))
}

fn parse_metadata(id: &PackageId, blob: &[u8]) -> Result<PackageMetadata, Error> {
    let text = std::str::from_utf8(blob).map_err(|e| PackageError::InvalidMetadata {
        message: format!("metadata is not UTF-8: {e}"),
    })?;
    let metadata = PackageMetadata::from_toml(text)?;

    if metadata.name != *id {
        return Err(PackageError::InvalidMetadata {
            message: format!("artifact declares package {}, expected {id}", metadata.name),
        }
        .into());
    }

    Ok(metadata)
}
