//! Package identity, declared metadata, and install descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use toolchest_errors::PackageError;

use crate::Version;

/// Name of the declared-metadata entry inside a `.tpkg` archive
pub const METADATA_ENTRY: &str = "package.toml";

/// Case-normalized package identifier
///
/// Identity key for store lookups. Always lowercase, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Create a package id, normalizing case
    ///
    /// # Errors
    /// Returns an error if the id is empty or contains characters outside
    /// `[a-z0-9._-]` after lowercasing.
    pub fn new(id: &str) -> Result<Self, PackageError> {
        let normalized = id.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(PackageError::InvalidId {
                id: id.to_string(),
                message: "package id must not be empty".to_string(),
            });
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(PackageError::InvalidId {
                id: id.to_string(),
                message: "package id may only contain letters, digits, '.', '_' and '-'"
                    .to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Get the normalized id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PackageId {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared package kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Tool,
    Library,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => f.write_str("tool"),
            Self::Library => f.write_str("library"),
        }
    }
}

/// Declared package metadata (the `package.toml` entry of an archive)
///
/// The integrity hash written next to an extracted package covers the raw
/// bytes of this document, not the archive itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: PackageId,
    pub version: Version,
    pub kind: PackageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageMetadata {
    /// Parse declared metadata from its TOML text
    ///
    /// # Errors
    /// Returns `PackageError::InvalidMetadata` if the document cannot be
    /// parsed or required fields are missing.
    pub fn from_toml(text: &str) -> Result<Self, PackageError> {
        toml::from_str(text).map_err(|e| PackageError::InvalidMetadata {
            message: e.to_string(),
        })
    }

    /// Serialize declared metadata to TOML text
    ///
    /// # Errors
    /// Returns `PackageError::InvalidMetadata` if serialization fails.
    pub fn to_toml(&self) -> Result<String, PackageError> {
        toml::to_string_pretty(self).map_err(|e| PackageError::InvalidMetadata {
            message: e.to_string(),
        })
    }
}

/// Candidate package sources plus the directory context the fetcher and
/// local installs operate in. Passed through, never mutated.
#[derive(Debug, Clone)]
pub struct PackageLocation {
    /// Candidate source base URLs, tried in order
    pub sources: Vec<String>,
    /// Root directory for local (non-global) installs
    pub root_dir: PathBuf,
}

impl PackageLocation {
    #[must_use]
    pub fn new(sources: Vec<String>, root_dir: PathBuf) -> Self {
        Self { sources, root_dir }
    }
}

/// The framework/runtime pair a manifest is built for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEnvironment {
    /// Target framework moniker, e.g. `net8.0`
    pub framework: String,
    /// Runtime identifier, e.g. `linux-x64`
    pub runtime: String,
}

impl TargetEnvironment {
    #[must_use]
    pub fn new(framework: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            runtime: runtime.into(),
        }
    }
}

/// Descriptor returned once a tool package has been installed
#[derive(Debug, Clone)]
pub struct InstalledToolPackage {
    pub id: PackageId,
    pub version: Version,
    /// Final directory holding the extracted package contents
    pub content_dir: PathBuf,
    /// Directory containing `tool-manifest.toml`
    pub manifest_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_normalizes_case() {
        let id = PackageId::new("Demo.Tool").unwrap();
        assert_eq!(id.as_str(), "demo.tool");
        assert_eq!(id, PackageId::new("demo.tool").unwrap());
    }

    #[test]
    fn test_package_id_rejects_empty() {
        assert!(PackageId::new("").is_err());
        assert!(PackageId::new("   ").is_err());
    }

    #[test]
    fn test_package_id_rejects_bad_chars() {
        assert!(PackageId::new("demo tool").is_err());
        assert!(PackageId::new("demo/tool").is_err());
    }

    #[test]
    fn test_metadata_round_trip() {
        let meta = PackageMetadata {
            name: PackageId::new("demo.tool").unwrap(),
            version: Version::parse("1.2.0").unwrap(),
            kind: PackageKind::Tool,
            description: None,
        };
        let text = meta.to_toml().unwrap();
        let parsed = PackageMetadata::from_toml(&text).unwrap();
        assert_eq!(parsed.name, meta.name);
        assert_eq!(parsed.version, meta.version);
        assert_eq!(parsed.kind, PackageKind::Tool);
    }

    #[test]
    fn test_metadata_rejects_garbage() {
        assert!(PackageMetadata::from_toml("not toml at all [").is_err());
        assert!(PackageMetadata::from_toml("name = \"x\"").is_err());
    }
}
