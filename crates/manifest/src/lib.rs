#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Persisted asset manifests for tool packages
//!
//! This crate defines the `tool-manifest.toml` format describing which
//! package files apply to the consumer's target framework and runtime,
//! and the builder that selects those files from an extracted package.

mod builder;

pub use builder::build_tool_manifest;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use toolchest_assets::AssetGroup;
use toolchest_errors::{Error, InstallError};
use toolchest_types::{PackageId, PackageKind, TargetEnvironment, Version};

/// Fixed manifest filename, one per install
pub const MANIFEST_FILENAME: &str = "tool-manifest.toml";

/// Persisted asset manifest (`tool-manifest.toml` contents)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub package: PackageSection,
    pub target: TargetEnvironment,
    #[serde(default)]
    pub assets: AssetsSection,
}

/// Package identity section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub id: PackageId,
    pub version: Version,
    pub kind: PackageKind,
}

/// Selected asset groups, keyed by category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsSection {
    #[serde(rename = "tools-assemblies", default)]
    pub tools_assemblies: Vec<AssetEntry>,
}

/// One selected asset item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl AssetManifest {
    /// Create a manifest with no selected assets
    #[must_use]
    pub fn new(
        id: PackageId,
        version: Version,
        kind: PackageKind,
        target: TargetEnvironment,
    ) -> Self {
        Self {
            package: PackageSection { id, version, kind },
            target,
            assets: AssetsSection::default(),
        }
    }

    /// Record a selected asset group under the tools-assemblies category
    pub fn set_tools_assemblies(&mut self, group: &AssetGroup) {
        self.assets.tools_assemblies = group
            .items
            .iter()
            .map(|item| AssetEntry {
                path: item.path.clone(),
                locale: item.locale.clone(),
                related: item.related.clone(),
            })
            .collect();
    }

    /// Parse a manifest file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn from_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        toml::from_str(&text).map_err(|e| {
            InstallError::ManifestError {
                message: format!("{}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Write the manifest into a directory under its fixed filename
    ///
    /// The file is written in one shot after successful serialization; a
    /// partial manifest is never left on disk.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf, Error> {
        let text = toml::to_string_pretty(self).map_err(|e| InstallError::ManifestError {
            message: e.to_string(),
        })?;

        let path = dir.join(MANIFEST_FILENAME);
        fs::write(&path, text)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        Ok(path)
    }
}
