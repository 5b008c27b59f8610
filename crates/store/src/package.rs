//! Stored tool package representation

use std::path::{Path, PathBuf};
use tokio::fs;
use toolchest_errors::{Error, PackageError};
use toolchest_types::{PackageMetadata, METADATA_ENTRY};

/// An extracted tool package inside a store
#[derive(Debug)]
pub struct StoredToolPackage {
    path: PathBuf,
    metadata: PackageMetadata,
}

impl StoredToolPackage {
    /// Load a stored package from its version directory
    ///
    /// # Errors
    /// Returns an error if the declared metadata is missing or malformed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let metadata_path = path.join(METADATA_ENTRY);
        let text = fs::read_to_string(&metadata_path).await.map_err(|_| {
            PackageError::InvalidMetadata {
                message: format!("missing {} in {}", METADATA_ENTRY, path.display()),
            }
        })?;
        let metadata = PackageMetadata::from_toml(&text)?;

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
        })
    }

    /// Get the declared package metadata
    #[must_use]
    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    /// Get the package directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all content files in the package, as paths relative to the
    /// package directory
    ///
    /// The downloaded artifact, its hash file, and the metadata entry are
    /// bookkeeping, not content, and are excluded.
    ///
    /// # Errors
    /// Returns an error if directory traversal fails.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, Error> {
        let mut files = Vec::new();
        let base = self.path.clone();
        self.collect_files(&base, &base, &mut files).await?;
        files.retain(|p| !Self::is_bookkeeping(p));
        files.sort();
        Ok(files)
    }

    fn is_bookkeeping(path: &Path) -> bool {
        if path == Path::new(METADATA_ENTRY) {
            return true;
        }
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(crate::ARTIFACT_EXTENSION | "hash")
        )
    }

    async fn collect_files(
        &self,
        base: &Path,
        dir: &Path,
        files: &mut Vec<PathBuf>,
    ) -> Result<(), Error> {
        let mut entries = fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = entry.metadata().await?;

            if metadata.is_dir() {
                Box::pin(self.collect_files(base, &path, files)).await?;
            } else if let Ok(rel) = path.strip_prefix(base) {
                files.push(rel.to_path_buf());
            }
        }

        Ok(())
    }
}
