#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared types for the toolchest tool-package manager
//!
//! Defines package identity, version constraints, declared package
//! metadata, and the target environment a manifest is built for.

mod package;
mod version;

pub use package::{
    InstalledToolPackage, PackageId, PackageKind, PackageLocation, PackageMetadata,
    TargetEnvironment, METADATA_ENTRY,
};
pub use version::{VersionConstraint, VersionSpec};

/// Re-export the semantic version type used throughout the workspace
pub use semver::Version;
