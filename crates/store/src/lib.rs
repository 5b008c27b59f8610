#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! On-disk layout of the toolchest package store
//!
//! A store is rooted at an arbitrary directory and lays packages out as
//! `<root>/<id>/<version>/` with the downloaded artifact and its hash
//! file alongside the extracted tree. Staging directories for global
//! installs live under `<root>/tmp/` until they are relocated.

mod archive;
mod package;

pub use archive::{create_package, extract_package, read_metadata};
pub use package::StoredToolPackage;

use std::path::{Path, PathBuf};
use tokio::fs;
use toolchest_errors::{Error, InstallError};
use toolchest_types::{PackageId, Version};
use uuid::Uuid;

/// Extension of downloaded package artifacts
pub const ARTIFACT_EXTENSION: &str = "tpkg";

/// Store manager for installed tool packages
#[derive(Debug, Clone)]
pub struct ToolPackageStore {
    root: PathBuf,
}

impl ToolPackageStore {
    /// Create a store instance over a root directory
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The store root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root directory for all versions of a package
    #[must_use]
    pub fn root_package_dir(&self, id: &PackageId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Version-qualified extraction directory for a package
    #[must_use]
    pub fn package_dir(&self, id: &PackageId, version: &Version) -> PathBuf {
        self.root_package_dir(id).join(version.to_string())
    }

    /// Path of the downloaded artifact for a package version
    #[must_use]
    pub fn artifact_path(&self, id: &PackageId, version: &Version) -> PathBuf {
        self.package_dir(id, version)
            .join(format!("{id}-{version}.{ARTIFACT_EXTENSION}"))
    }

    /// Path of the integrity hash file for a package version
    #[must_use]
    pub fn hash_path(&self, id: &PackageId, version: &Version) -> PathBuf {
        self.package_dir(id, version)
            .join(format!("{id}-{version}.{ARTIFACT_EXTENSION}.hash"))
    }

    /// Allocate a fresh staging directory under the store root
    ///
    /// Each call returns a unique directory; concurrent installs of
    /// different packages therefore never collide.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub async fn staging_dir(&self) -> Result<PathBuf, Error> {
        let path = self.root.join("tmp").join(format!("stage-{}", Uuid::new_v4()));
        fs::create_dir_all(&path)
            .await
            .map_err(|e| InstallError::FilesystemError {
                operation: "create_staging_dir".to_string(),
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(path)
    }

    /// Look up an extracted package by id and version
    ///
    /// Returns `Ok(None)` when the version directory does not exist;
    /// callers decide whether that is fatal.
    ///
    /// # Errors
    /// Returns an error if the directory exists but its declared
    /// metadata cannot be read.
    pub async fn find_package(
        &self,
        id: &PackageId,
        version: &Version,
    ) -> Result<Option<StoredToolPackage>, Error> {
        let dir = self.package_dir(id, version);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(Some(StoredToolPackage::load(&dir).await?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PackageId {
        s.parse().unwrap()
    }

    fn version(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_layout_paths() {
        let store = ToolPackageStore::new(PathBuf::from("/store"));
        let demo = id("demo.tool");
        let v = version("1.2.0");

        assert_eq!(
            store.package_dir(&demo, &v),
            PathBuf::from("/store/demo.tool/1.2.0")
        );
        assert_eq!(
            store.artifact_path(&demo, &v),
            PathBuf::from("/store/demo.tool/1.2.0/demo.tool-1.2.0.tpkg")
        );
        assert_eq!(
            store.hash_path(&demo, &v),
            PathBuf::from("/store/demo.tool/1.2.0/demo.tool-1.2.0.tpkg.hash")
        );
    }

    #[tokio::test]
    async fn test_staging_dirs_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ToolPackageStore::new(tmp.path().to_path_buf());

        let a = store.staging_dir().await.unwrap();
        let b = store.staging_dir().await.unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir());
        assert!(b.is_dir());
    }

    #[tokio::test]
    async fn test_find_package_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ToolPackageStore::new(tmp.path().to_path_buf());

        let found = store
            .find_package(&id("demo.tool"), &version("1.0.0"))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
